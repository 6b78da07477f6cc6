//! Golden round-agreement vectors.
//!
//! Every client implementing the start-round convention must produce the
//! same `epoch_start` and `intent` for these inputs, and the callee side must
//! recompute the same `epoch_start` from `callee_round`.

use serde::{Deserialize, Serialize};

use callwheel_core::{Intent, Round, RoundSyncer};

/// A single golden vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundVector {
    pub name: String,
    pub description: String,

    // Syncer parameters
    pub epoch_len: u32,
    pub lead: u32,
    pub intents: u32,

    // Inputs
    pub caller_round: u32,
    pub callee_round: u32,

    // Expected outputs
    pub epoch_start: u32,
    pub intent: u32,
}

fn vector(
    name: &str,
    description: &str,
    (epoch_len, lead, intents): (u32, u32, u32),
    (caller_round, callee_round): (u32, u32),
    (epoch_start, intent): (u32, u32),
) -> RoundVector {
    RoundVector {
        name: name.to_string(),
        description: description.to_string(),
        epoch_len,
        lead,
        intents,
        caller_round,
        callee_round,
        epoch_start,
        intent,
    }
}

/// All golden vectors.
pub fn all_vectors() -> Vec<RoundVector> {
    vec![
        vector(
            "standard_same_round",
            "Caller and callee both see round 100",
            (10, 10, 4),
            (100, 100),
            (110, 3),
        ),
        vector(
            "standard_callee_ahead",
            "Callee sees the round just before the start",
            (10, 10, 4),
            (101, 119),
            (120, 0),
        ),
        vector(
            "standard_callee_at_start",
            "Callee sees exactly the start round",
            (10, 10, 4),
            (95, 110),
            (110, 3),
        ),
        vector(
            "genesis",
            "Call placed at round zero",
            (10, 10, 4),
            (0, 0),
            (10, 1),
        ),
        vector(
            "wide_epochs",
            "Hundred-round epochs with a short lead",
            (100, 50, 2),
            (1234, 1299),
            (1300, 1),
        ),
        vector(
            "minimal_intents",
            "Two intents, the smallest count that still agrees",
            (10, 10, 2),
            (100, 109),
            (110, 1),
        ),
        vector(
            "single_round_epochs",
            "Every round is an epoch boundary",
            (1, 3, 4),
            (500, 501),
            (503, 3),
        ),
    ]
}

/// Check one vector against the implementation.
pub fn verify_vector(v: &RoundVector) -> Result<(), String> {
    let syncer = RoundSyncer::new(v.epoch_len, v.lead, v.intents)
        .map_err(|e| format!("{}: {}", v.name, e))?;

    let (start, intent) = syncer
        .outgoing_call_convo_round(Round(v.caller_round))
        .map_err(|e| format!("{}: {}", v.name, e))?;
    if start != Round(v.epoch_start) || intent != Intent(v.intent) {
        return Err(format!(
            "{}: outgoing expected ({}, {}), got ({}, {})",
            v.name, v.epoch_start, v.intent, start, intent
        ));
    }

    let recomputed = syncer
        .incoming_call_convo_round(Round(v.callee_round), Intent(v.intent))
        .map_err(|e| format!("{}: {}", v.name, e))?;
    if recomputed != Round(v.epoch_start) {
        return Err(format!(
            "{}: incoming expected {}, got {}",
            v.name, v.epoch_start, recomputed
        ));
    }

    Ok(())
}

/// Check every vector, collecting failures.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

/// Vectors as pretty JSON, for other implementations to consume.
pub fn vectors_json() -> String {
    serde_json::to_string_pretty(&all_vectors()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        if let Err(failures) = verify_all_vectors() {
            panic!("golden vectors failed:\n{}", failures.join("\n"));
        }
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_vectors_json_parses_back() {
        let parsed: Vec<RoundVector> = serde_json::from_str(&vectors_json()).unwrap();
        assert_eq!(parsed, all_vectors());
    }

    #[test]
    fn test_tampered_vector_fails() {
        let mut v = all_vectors().remove(0);
        v.epoch_start += 1;
        assert!(verify_vector(&v).is_err());
    }
}
