use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight tracked statement categories.
///
/// Kept as a flat enum plus static attribute tables rather than a type per
/// kind: categories are tagged data, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalKind {
    Definition,
    Theorem,
    Lemma,
    Proposition,
    Corollary,
    Construction,
    Example,
    Remark,
}

impl CanonicalKind {
    /// Legend order; also the order categories are reported in.
    pub const ALL: [CanonicalKind; 8] = [
        CanonicalKind::Definition,
        CanonicalKind::Theorem,
        CanonicalKind::Lemma,
        CanonicalKind::Proposition,
        CanonicalKind::Corollary,
        CanonicalKind::Construction,
        CanonicalKind::Example,
        CanonicalKind::Remark,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CanonicalKind::Definition => "definition",
            CanonicalKind::Theorem => "theorem",
            CanonicalKind::Lemma => "lemma",
            CanonicalKind::Proposition => "proposition",
            CanonicalKind::Corollary => "corollary",
            CanonicalKind::Construction => "construction",
            CanonicalKind::Example => "example",
            CanonicalKind::Remark => "remark",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CanonicalKind::Definition => "Definition",
            CanonicalKind::Theorem => "Theorem",
            CanonicalKind::Lemma => "Lemma",
            CanonicalKind::Proposition => "Proposition",
            CanonicalKind::Corollary => "Corollary",
            CanonicalKind::Construction => "Construction",
            CanonicalKind::Example => "Example",
            CanonicalKind::Remark => "Remark",
        }
    }

    /// Node shape token, consumed by the serializer.
    pub fn shape(self) -> &'static str {
        match self {
            CanonicalKind::Theorem => "doublecircle",
            CanonicalKind::Definition => "box",
            CanonicalKind::Proposition | CanonicalKind::Construction => "diamond",
            CanonicalKind::Lemma
            | CanonicalKind::Corollary
            | CanonicalKind::Example
            | CanonicalKind::Remark => "ellipse",
        }
    }

    /// Border color token, consumed by the serializer.
    pub fn border_color(self) -> &'static str {
        match self {
            CanonicalKind::Theorem
            | CanonicalKind::Proposition
            | CanonicalKind::Lemma
            | CanonicalKind::Corollary => "Blue",
            CanonicalKind::Definition | CanonicalKind::Construction => "Purple",
            CanonicalKind::Example | CanonicalKind::Remark => "DimGray",
        }
    }

    /// Fill color token, consumed by the serializer.
    pub fn fill_color(self) -> &'static str {
        match self {
            CanonicalKind::Theorem | CanonicalKind::Proposition | CanonicalKind::Lemma => "SkyBlue",
            CanonicalKind::Definition => "Lavender",
            CanonicalKind::Corollary
            | CanonicalKind::Construction
            | CanonicalKind::Example
            | CanonicalKind::Remark => "White",
        }
    }
}

impl fmt::Display for CanonicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve an environment name against the alias table. Case-insensitive
/// exact match; anything unrecognized yields `None` and is treated as a
/// transparent wrapper by the pipeline.
pub fn resolve(name: &str) -> Option<CanonicalKind> {
    let lowered = name.trim().to_ascii_lowercase();
    let kind = match lowered.as_str() {
        "definition" | "defn" | "def" => CanonicalKind::Definition,
        "theorem" | "thm" | "th" | "thrm" => CanonicalKind::Theorem,
        "lemma" | "lem" | "ilemma" | "alemma" => CanonicalKind::Lemma,
        "proposition" | "propn" | "prop" | "prp" => CanonicalKind::Proposition,
        "corollary" | "cor" | "corol" | "corl" => CanonicalKind::Corollary,
        "construction" | "constn" | "const" | "constr" => CanonicalKind::Construction,
        "example" | "examples" | "iexample" => CanonicalKind::Example,
        "remark" | "remarks" => CanonicalKind::Remark,
        _ => return None,
    };
    Some(kind)
}

/// Proof environments sit outside the eight categories: they open a proof
/// scope instead of a statement scope.
pub fn is_proof(name: &str) -> bool {
    matches!(
        name.trim().to_ascii_lowercase().as_str(),
        "proof" | "pr" | "pf" | "prf" | "pfof" | "pfoftheorem"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(resolve("Thm"), Some(CanonicalKind::Theorem));
        assert_eq!(resolve("LEMMA"), Some(CanonicalKind::Lemma));
        assert_eq!(resolve("defn"), Some(CanonicalKind::Definition));
        assert_eq!(resolve("corl"), Some(CanonicalKind::Corollary));
        assert_eq!(resolve("constr"), Some(CanonicalKind::Construction));
        assert_eq!(resolve("iexample"), Some(CanonicalKind::Example));
        assert_eq!(resolve("remarks"), Some(CanonicalKind::Remark));
        assert_eq!(resolve("prp"), Some(CanonicalKind::Proposition));
    }

    #[test]
    fn unknown_environments_do_not_resolve() {
        assert_eq!(resolve("equation"), None);
        assert_eq!(resolve("align*"), None);
        assert_eq!(resolve(""), None);
        // aliases are exact matches, not prefixes
        assert_eq!(resolve("theorems"), None);
    }

    #[test]
    fn proof_aliases_are_not_statement_kinds() {
        for alias in ["proof", "Pf", "PRF", "pfoftheorem"] {
            assert!(is_proof(alias));
            assert_eq!(resolve(alias), None);
        }
        assert!(!is_proof("lemma"));
    }

    #[test]
    fn every_kind_carries_a_full_attribute_triple() {
        for kind in CanonicalKind::ALL {
            assert!(!kind.shape().is_empty());
            assert!(!kind.border_color().is_empty());
            assert!(!kind.fill_color().is_empty());
        }
        assert_eq!(CanonicalKind::Theorem.shape(), "doublecircle");
        assert_eq!(CanonicalKind::Definition.fill_color(), "Lavender");
        assert_eq!(CanonicalKind::Remark.border_color(), "DimGray");
    }
}
