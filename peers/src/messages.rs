//! Node RPC bodies sent to work peers.

use serde::{Deserialize, Serialize};

use powrace_types::{BlockHash, WorkRequest};

/// `{"action": "work_generate", "hash": ..., "difficulty": ...}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkGenerateAction {
    pub action: String,
    #[serde(flatten)]
    pub request: WorkRequest,
}

impl WorkGenerateAction {
    pub fn new(request: WorkRequest) -> Self {
        Self {
            action: "work_generate".to_string(),
            request,
        }
    }
}

/// `{"action": "work_cancel", "hash": ...}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCancelAction {
    pub action: String,
    pub hash: BlockHash,
}

impl WorkCancelAction {
    pub fn new(hash: BlockHash) -> Self {
        Self {
            action: "work_cancel".to_string(),
            hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powrace_types::Difficulty;

    #[test]
    fn work_generate_wire_shape() {
        let req = WorkRequest::new(BlockHash::new([0xAB; 32]), Difficulty(0xfffffff800000000));
        let json = serde_json::to_value(WorkGenerateAction::new(req)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "work_generate",
                "hash": "AB".repeat(32),
                "difficulty": "fffffff800000000",
            })
        );
    }

    #[test]
    fn work_cancel_wire_shape() {
        let json = serde_json::to_value(WorkCancelAction::new(BlockHash::ZERO)).unwrap();
        assert_eq!(json["action"], "work_cancel");
        assert_eq!(json["hash"], "0".repeat(64));
        assert!(json.get("difficulty").is_none());
    }
}
