use serde::Serialize;

/// 100 if every stream's chain verified clean, else 0 (§4.L "Integrity
/// score"). Takes one `valid` flag per stream checked rather than the
/// `at-store` report type directly, so this crate stays a pure evaluator
/// over plain values.
pub fn integrity_score(stream_valid: &[bool]) -> i32 {
    if stream_valid.iter().all(|v| *v) {
        100
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub integrity: i32,
    pub consistency: i32,
    pub witness_confidence: i32,
}

impl Components {
    fn min(self) -> i32 {
        self.integrity.min(self.consistency).min(self.witness_confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Verified,
    High,
    Moderate,
    Low,
    Untrusted,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrustVerdict {
    pub trust_score: i32,
    pub level: TrustLevel,
    pub components: Components,
    pub explanation: String,
}

/// `trustScore = round(0.30*integrity + 0.35*consistency + 0.35*witnessConfidence)`
/// and the level classification of §4.L, evaluated in order — first match
/// wins.
pub fn compose_verdict(components: Components) -> TrustVerdict {
    let trust_score = (0.30 * components.integrity as f64
        + 0.35 * components.consistency as f64
        + 0.35 * components.witness_confidence as f64)
        .round() as i32;
    let min_component = components.min();

    let level = if components.integrity >= 95
        && components.consistency >= 95
        && components.witness_confidence >= 95
    {
        TrustLevel::Verified
    } else if components.integrity == 0 || components.consistency == 0 || components.witness_confidence == 0
    {
        TrustLevel::Untrusted
    } else if trust_score >= 85 && min_component >= 70 {
        TrustLevel::High
    } else if trust_score >= 65 && min_component >= 40 {
        TrustLevel::Moderate
    } else if trust_score >= 40 {
        TrustLevel::Low
    } else {
        TrustLevel::Untrusted
    };

    let explanation = explain(&components, trust_score, level);

    TrustVerdict {
        trust_score,
        level,
        components,
        explanation,
    }
}

fn explain(components: &Components, trust_score: i32, level: TrustLevel) -> String {
    format!(
        "trust score {trust_score} ({level:?}): integrity {}, consistency {}, witness corroboration {}",
        tier_word(components.integrity),
        tier_word(components.consistency),
        tier_word(components.witness_confidence),
    )
}

fn tier_word(v: i32) -> String {
    let word = if v >= 95 {
        "excellent"
    } else if v >= 85 {
        "strong"
    } else if v >= 70 {
        "adequate"
    } else if v >= 40 {
        "weak"
    } else if v > 0 {
        "poor"
    } else {
        "failed"
    };
    format!("{word} ({v})")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comps(i: i32, c: i32, w: i32) -> Components {
        Components {
            integrity: i,
            consistency: c,
            witness_confidence: w,
        }
    }

    #[test]
    fn all_high_yields_verified() {
        let v = compose_verdict(comps(100, 100, 100));
        assert_eq!(v.level, TrustLevel::Verified);
        assert_eq!(v.trust_score, 100);
    }

    #[test]
    fn any_zero_component_yields_untrusted_regardless_of_average() {
        let v = compose_verdict(comps(0, 100, 100));
        assert_eq!(v.level, TrustLevel::Untrusted);
    }

    #[test]
    fn chain_tamper_drives_untrusted() {
        let v = compose_verdict(comps(0, 100, 100));
        assert_eq!(v.components.integrity, 0);
        assert_eq!(v.level, TrustLevel::Untrusted);
    }

    #[test]
    fn moderate_band() {
        let v = compose_verdict(comps(70, 65, 65));
        assert_eq!(v.level, TrustLevel::Moderate);
    }

    #[test]
    fn high_band() {
        let v = compose_verdict(comps(100, 85, 85));
        assert_eq!(v.level, TrustLevel::High);
    }
}
