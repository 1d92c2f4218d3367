//! Equipment identifier to optics profile mapping.
//!
//! Free-text equipment strings are matched case-insensitively against an
//! ordered keyword catalog. The first entry with a matching keyword wins, so
//! specific models sit above the generic families that would shadow them
//! ("dwarf iii" must be tried before "dwarf ii"). Class words such as
//! "lens" or "camera" are never keywords on their own.

use crate::models::{IconClass, OpticsProfile};

struct CatalogEntry {
    keywords: &'static [&'static str],
    name: &'static str,
    field_of_view: &'static str,
    icon: IconClass,
    exposure_rule: Option<&'static str>,
}

impl CatalogEntry {
    fn matches(&self, needle: &str) -> bool {
        self.keywords.iter().any(|k| needle.contains(k))
    }

    fn profile(&self) -> OpticsProfile {
        OpticsProfile {
            canonical_name: self.name.to_string(),
            field_of_view_descriptor: self.field_of_view.to_string(),
            icon_class: self.icon,
            exposure_rule: self.exposure_rule.map(str::to_string),
        }
    }
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        keywords: &["dwarf 3", "dwarf3", "dwarf iii"],
        name: "Dwarf 3",
        field_of_view: "2.9° x 1.6° (wide smart-telescope field)",
        icon: IconClass::Camera,
        exposure_rule: Some("Dwarf 3: exposures of 15 s to 20 s."),
    },
    CatalogEntry {
        keywords: &["dwarf ii", "dwarf 2", "dwarf2", "dwarf"],
        name: "Dwarf II",
        field_of_view: "3.2° x 1.8° (wide smart-telescope field)",
        icon: IconClass::Camera,
        exposure_rule: Some(
            "Dwarf II: maximum exposure 15 s. Binning 2x2 (2K) for deep-sky objects. \
             UHC/dual-band filter when the Moon is bright.",
        ),
    },
    CatalogEntry {
        keywords: &["seestar s30", "s30"],
        name: "Seestar S30",
        field_of_view: "4.3° x 2.4° (wide smart-telescope field)",
        icon: IconClass::Reflector,
        exposure_rule: Some(
            "Seestar S30: exposures of 10 s, 20 s or 30 s only. Enable the dual-band filter for nebulae.",
        ),
    },
    CatalogEntry {
        keywords: &["seestar", "s50"],
        name: "Seestar S50",
        field_of_view: "1.3° x 0.7° (compact smart-telescope field)",
        icon: IconClass::Reflector,
        exposure_rule: Some(
            "Seestar S50: exposures of 10 s, 20 s or 30 s only. Enable the dual-band filter for nebulae. \
             Gain: high unless the Moon is bright.",
        ),
    },
    CatalogEntry {
        keywords: &["10x50"],
        name: "10x50 Binoculars",
        field_of_view: "6.5° (very wide visual field)",
        icon: IconClass::Binocular,
        exposure_rule: Some(
            "10x50 binoculars: visual observing only. Use \"N/A\" for exposure, gain and binning.",
        ),
    },
    CatalogEntry {
        keywords: &["binocular", "binos"],
        name: "Binoculars",
        field_of_view: "3° to 7° (wide visual field, depends on magnification)",
        icon: IconClass::Binocular,
        exposure_rule: Some(
            "Binoculars: visual observing only. Use \"N/A\" for exposure, gain and binning.",
        ),
    },
    CatalogEntry {
        keywords: &["redcat", "william optics", "refractor"],
        name: "Small Refractor + Astro Camera",
        field_of_view: "3.6° x 2.4° (wide refractor field)",
        icon: IconClass::Reflector,
        exposure_rule: None,
    },
    CatalogEntry {
        keywords: &[
            "dslr",
            "mirrorless",
            "canon",
            "nikon",
            "sony",
            "fujifilm",
            "camera + lens",
            "camera and lens",
        ],
        name: "Camera + Lens",
        field_of_view: "10° x 7° (50 mm lens on APS-C)",
        icon: IconClass::Camera,
        exposure_rule: Some(
            "Camera + lens: keep untracked exposures under the 500-rule limit; use a tracker for longer subs.",
        ),
    },
];

fn default_profile() -> OpticsProfile {
    OpticsProfile {
        canonical_name: "Generic Telescope".to_string(),
        field_of_view_descriptor: "1° x 0.7° (mid-range field)".to_string(),
        icon_class: IconClass::Reflector,
        exposure_rule: None,
    }
}

/// Resolve a free-text equipment identifier. Total: unknown or empty input
/// yields the generic mid-range profile.
pub fn resolve_optics(identifier: &str) -> OpticsProfile {
    let needle = identifier.trim().to_lowercase();
    if needle.is_empty() {
        return default_profile();
    }
    CATALOG
        .iter()
        .find(|entry| entry.matches(&needle))
        .map(CatalogEntry::profile)
        .unwrap_or_else(default_profile)
}

/// Profile lookup for display before a plan is requested; `None` maps to the
/// default profile.
pub fn lookup_optics(identifier: Option<&str>) -> OpticsProfile {
    resolve_optics(identifier.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_inputs_share_default() {
        let default = resolve_optics("");
        assert_eq!(default.canonical_name, "Generic Telescope");
        assert_eq!(lookup_optics(None), default);
        assert_eq!(resolve_optics("Unknown Widget 9000"), default);
        assert_eq!(resolve_optics("   "), default);
    }

    #[test]
    fn test_dwarf_ii_inside_free_text() {
        let p = resolve_optics("My Dwarf II on a tripod");
        assert_eq!(p.canonical_name, "Dwarf II");
        assert_eq!(p.icon_class, IconClass::Camera);
        assert!(p.exposure_rule.unwrap().contains("15 s"));
    }

    #[test]
    fn test_specific_model_not_shadowed() {
        assert_eq!(resolve_optics("dwarf iii").canonical_name, "Dwarf 3");
        assert_eq!(resolve_optics("DWARF 3 smart scope").canonical_name, "Dwarf 3");
        assert_eq!(resolve_optics("Seestar S30 Pro").canonical_name, "Seestar S30");
        assert_eq!(resolve_optics("ZWO Seestar S50").canonical_name, "Seestar S50");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve_optics("SEESTAR").canonical_name, "Seestar S50");
        assert_eq!(resolve_optics("celestron 10X50 binos").icon_class, IconClass::Binocular);
    }

    #[test]
    fn test_camera_rigs() {
        assert_eq!(resolve_optics("Canon R6 + 135mm").canonical_name, "Camera + Lens");
        assert_eq!(resolve_optics("RedCat 51 with ASI533").canonical_name, "Small Refractor + Astro Camera");
    }

    #[test]
    fn test_generic_words_do_not_pick_a_device() {
        let scope = resolve_optics("Celestron 8SE with focal reducer lens");
        assert_eq!(scope.canonical_name, "Generic Telescope");
        assert_eq!(resolve_optics("8SE with ZWO camera").canonical_name, "Generic Telescope");

        let binos = resolve_optics("Sky-Watcher 15x70 binoculars");
        assert_eq!(binos.canonical_name, "Binoculars");
        assert_eq!(binos.icon_class, IconClass::Binocular);
        assert!(!binos.field_of_view_descriptor.contains("6.5"));
        assert_eq!(resolve_optics("10x50 binoculars").canonical_name, "10x50 Binoculars");
    }

    #[test]
    fn test_every_catalog_entry_reachable_by_its_first_keyword() {
        for entry in CATALOG {
            assert_eq!(resolve_optics(entry.keywords[0]).canonical_name, entry.name);
        }
    }

    #[test]
    fn test_profile_serialization() {
        let json = serde_json::to_value(resolve_optics("10x50")).unwrap();
        assert_eq!(json["canonicalName"], "10x50 Binoculars");
        assert_eq!(json["iconClass"], "binocular");
        assert!(json["fieldOfViewDescriptor"].as_str().unwrap().contains("6.5"));
    }
}
