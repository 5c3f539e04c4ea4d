use serde::Serialize;

use crate::domain::MatchId;
use crate::services::FailedStep;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

/// 207 body: the match exists, some dependent writes did not land.
/// Missing deltas are reported under `error`, missing player updates under
/// `warning`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSuccessBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    pub match_id: MatchId,
    pub failed_steps: Vec<FailedStep>,
}

impl PartialSuccessBody {
    pub fn new(match_id: MatchId, failed_steps: Vec<FailedStep>) -> Self {
        let deltas_missing = failed_steps.contains(&FailedStep::RatingDeltas);
        let (error, warning) = if deltas_missing {
            (Some("Match recorded, but ELO rankings couldn't be updated"), None)
        } else {
            (None, Some("Match recorded, but player statistics may not be fully updated"))
        };

        Self {
            error,
            warning,
            match_id,
            failed_steps,
        }
    }
}
