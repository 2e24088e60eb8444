use {
    crate::latency::LatencyMeasurement,
    std::collections::{BTreeSet, HashMap},
    thiserror::Error,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no reachable region: candidate set is empty")]
    NoReachableRegion,
}

/// Best-first total order of region codes.
///
/// Reachable regions come first, strictly ascending by measured latency with
/// ties broken by ascending code; unreachable (or unmeasured) regions follow
/// in ascending code order. An override code always occupies position 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOrder {
    codes: Vec<String>,
}

impl SelectionOrder {
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

/// Builds the fallback chain. A nonempty all-failed candidate set is still a
/// valid order: a failed probe does not prove the submission endpoint is
/// down, the two endpoints may differ.
pub fn select(
    candidates: &[String],
    measurements: &HashMap<String, LatencyMeasurement>,
    override_code: Option<&str>,
) -> Result<SelectionOrder, SelectError> {
    let candidates: BTreeSet<&str> = candidates.iter().map(String::as_str).collect();

    let mut reachable = Vec::new();
    let mut unreachable = Vec::new();
    for code in candidates {
        if Some(code) == override_code {
            continue;
        }
        match measurements.get(code).and_then(LatencyMeasurement::latency) {
            Some(latency) => reachable.push((latency, code.to_owned())),
            None => unreachable.push(code.to_owned()),
        }
    }
    reachable.sort();
    unreachable.sort();

    let mut codes = Vec::with_capacity(reachable.len() + unreachable.len() + 1);
    if let Some(code) = override_code {
        codes.push(code.to_owned());
    }
    codes.extend(reachable.into_iter().map(|(_latency, code)| code));
    codes.extend(unreachable);

    if codes.is_empty() {
        return Err(SelectError::NoReachableRegion);
    }
    Ok(SelectionOrder { codes })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::latency::ProbeOutcome,
        std::time::Duration,
    };

    fn measured(code: &str, latency_ms: Option<u64>) -> (String, LatencyMeasurement) {
        let outcome = match latency_ms {
            Some(ms) => ProbeOutcome::Reachable {
                avg: Duration::from_millis(ms),
            },
            None => ProbeOutcome::Unreachable,
        };
        (
            code.to_owned(),
            LatencyMeasurement {
                code: code.to_owned(),
                outcome,
                samples: vec![],
                measured_at_ms: 0,
            },
        )
    }

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|code| (*code).to_owned()).collect()
    }

    #[test]
    fn fastest_region_comes_first() {
        let measurements = HashMap::from([
            measured("ny", Some(40)),
            measured("dallas", Some(12)),
            measured("slc", None),
        ]);
        let order = select(&codes(&["ny", "dallas", "slc"]), &measurements, None).unwrap();
        assert_eq!(order.codes(), &["dallas", "ny", "slc"]);
    }

    #[test]
    fn ties_break_by_ascending_code() {
        let measurements = HashMap::from([
            measured("slc", Some(25)),
            measured("dallas", Some(25)),
            measured("ny", Some(25)),
        ]);
        for _ in 0..16 {
            let order = select(&codes(&["slc", "dallas", "ny"]), &measurements, None).unwrap();
            assert_eq!(order.codes(), &["dallas", "ny", "slc"]);
        }
    }

    #[test]
    fn all_failed_set_keeps_full_length_in_code_order() {
        let measurements = HashMap::from([
            measured("slc", None),
            measured("ny", None),
            measured("dallas", None),
        ]);
        let order = select(&codes(&["slc", "ny", "dallas"]), &measurements, None).unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order.codes(), &["dallas", "ny", "slc"]);
    }

    #[test]
    fn override_takes_position_zero() {
        let measurements = HashMap::from([
            measured("ny", Some(5)),
            measured("dallas", Some(90)),
            measured("slc", Some(50)),
        ]);
        let order = select(
            &codes(&["ny", "dallas", "slc"]),
            &measurements,
            Some("dallas"),
        )
        .unwrap();
        assert_eq!(order.codes(), &["dallas", "ny", "slc"]);
    }

    #[test]
    fn override_absent_from_measurements_is_still_first() {
        let measurements = HashMap::from([measured("ny", Some(5))]);
        let order = select(&codes(&["ny"]), &measurements, Some("dallas")).unwrap();
        assert_eq!(order.codes(), &["dallas", "ny"]);
    }

    #[test]
    fn empty_candidates_fail_with_no_reachable_region() {
        let measurements = HashMap::new();
        assert_eq!(
            select(&[], &measurements, None).err(),
            Some(SelectError::NoReachableRegion)
        );
    }

    #[test]
    fn duplicate_candidates_appear_once() {
        let measurements = HashMap::from([measured("ny", Some(5))]);
        let order = select(&codes(&["ny", "ny"]), &measurements, None).unwrap();
        assert_eq!(order.codes(), &["ny"]);
    }
}
