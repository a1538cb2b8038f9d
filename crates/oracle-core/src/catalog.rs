//! The what-if scenario catalog and its static outcome tables.
//!
//! Five scenarios are offered. Three have bespoke outcome templates; the
//! rest, and any id the catalog does not know, get the generic template.
//! Parameter overrides are clamped into `[0.5 x default, 1.5 x default]`
//! (ordered, so negative defaults work too).

use std::collections::BTreeMap;

use oracle_types::{OutcomeReport, ParameterRange, ParameterSet, Scenario, ScenarioCategory};
use rust_decimal::Decimal;
use tracing::debug;

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|&l| l.to_owned()).collect()
}

/// Fraction of the default at the low end of the slider.
const LOWER_FACTOR: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
/// Fraction of the default at the high end of the slider.
const UPPER_FACTOR: Decimal = Decimal::from_parts(15, 0, 0, false, 1);
/// Defaults whose magnitude exceeds this get integer steps.
const COARSE_STEP_THRESHOLD: Decimal = Decimal::TEN;

/// Static outcome table for one scenario.
#[derive(Debug, Clone, Copy)]
struct OutcomeTemplate {
    probability_percent: u8,
    timeframe: &'static str,
    /// Impact score in tenths (`85` is `8.5`).
    impact_tenths: i64,
    positive: &'static [&'static str],
    negative: &'static [&'static str],
    neutral: &'static [&'static str],
}

impl OutcomeTemplate {
    fn report(&self, scenario_title: &str) -> OutcomeReport {
        OutcomeReport {
            scenario_title: scenario_title.to_owned(),
            positive_outcomes: owned(self.positive),
            negative_outcomes: owned(self.negative),
            neutral_outcomes: owned(self.neutral),
            probability_percent: self.probability_percent,
            timeframe_label: self.timeframe.to_owned(),
            global_impact_score: Decimal::new(self.impact_tenths, 1),
        }
    }
}

const CLIMATE_ACTION: OutcomeTemplate = OutcomeTemplate {
    probability_percent: 75,
    timeframe: "10-15 years",
    impact_tenths: 85,
    positive: &[
        "Global CO2 emissions reduced by 35%",
        "Green technology investment increases by $2T",
        "Air quality improves in major cities",
        "Renewable energy jobs created: 25M+",
    ],
    negative: &[
        "Initial GDP reduction of 2.5% globally",
        "Energy costs increase by 15-20%",
        "Some industries face significant restructuring",
        "Developing nations need financial support",
    ],
    neutral: &[
        "Transition period of 5-7 years expected",
        "Consumer behavior adapts gradually",
        "Technology innovation accelerates",
    ],
};

const PEACE_TREATY: OutcomeTemplate = OutcomeTemplate {
    probability_percent: 65,
    timeframe: "2-5 years",
    impact_tenths: 72,
    positive: &[
        "Military spending redirected to development",
        "Refugee crisis resolved for 6M+ people",
        "Regional economic recovery begins",
        "Global food security improves",
    ],
    negative: &[
        "Reconstruction costs exceed $500B",
        "Political tensions remain in some areas",
        "War crimes tribunals create ongoing disputes",
    ],
    neutral: &[
        "International monitoring required",
        "Gradual normalization of relations",
        "Energy markets stabilize",
    ],
};

const ECONOMIC_COOPERATION: OutcomeTemplate = OutcomeTemplate {
    probability_percent: 70,
    timeframe: "3-8 years",
    impact_tenths: 68,
    positive: &[
        "Global GDP increases by $8T over 5 years",
        "Trade barriers reduced by 40%",
        "Technology transfer accelerates",
        "Emerging markets benefit significantly",
    ],
    negative: &[
        "Some domestic industries face competition",
        "Regulatory harmonization challenges",
        "Potential for trade disputes",
    ],
    neutral: &[
        "Gradual implementation over 3 years",
        "Mixed short-term effects",
        "Long-term benefits more pronounced",
    ],
};

const GENERIC: OutcomeTemplate = OutcomeTemplate {
    probability_percent: 60,
    timeframe: "5-10 years",
    impact_tenths: 50,
    positive: &["Positive outcomes likely", "Innovation accelerated"],
    negative: &["Some challenges expected", "Adaptation period required"],
    neutral: &["Mixed results anticipated"],
};

/// Slider range for a parameter with the given default.
pub fn parameter_range(default: Decimal) -> ParameterRange {
    let a = default.saturating_mul(LOWER_FACTOR);
    let b = default.saturating_mul(UPPER_FACTOR);
    let step = if default.abs() > COARSE_STEP_THRESHOLD {
        Decimal::ONE
    } else {
        Decimal::new(1, 1)
    };
    ParameterRange {
        default,
        min: a.min(b).normalize(),
        max: a.max(b).normalize(),
        step,
    }
}

/// The fixed set of what-if scenarios and their outcome tables.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
    templates: BTreeMap<&'static str, OutcomeTemplate>,
}

impl ScenarioCatalog {
    /// The five standard scenarios.
    pub fn standard() -> Self {
        let scenarios = vec![
            scenario(
                "climate-action",
                "Global Carbon Tax Implementation",
                "What if all countries implement a $100/ton carbon tax?",
                ScenarioCategory::Environment,
                "\u{1f331}",
                &[("carbonTax", 100, 0), ("compliance", 85, 0), ("economicImpact", -25, 1)],
            ),
            scenario(
                "peace-treaty",
                "Major Conflict Resolution",
                "What if Russia-Ukraine conflict ends with peace treaty?",
                ScenarioCategory::Conflict,
                "\u{1f54a}\u{fe0f}",
                &[("conflictReduction", 80, 0), ("economicRecovery", 15, 0), ("refugeeReturn", 60, 0)],
            ),
            scenario(
                "economic-cooperation",
                "Global Trade Alliance",
                "What if major economies form new trade alliance?",
                ScenarioCategory::Economy,
                "\u{1f91d}",
                &[("tradeIncrease", 25, 0), ("gdpGrowth", 32, 1), ("inflation", -15, 1)],
            ),
            scenario(
                "renewable-transition",
                "Rapid Renewable Energy Shift",
                "What if renewable energy reaches 80% by 2030?",
                ScenarioCategory::Environment,
                "\u{26a1}",
                &[("renewablePercent", 80, 0), ("jobsCreated", 50_000_000, 0), ("emissions", -45, 0)],
            ),
            scenario(
                "cyber-security",
                "Global Cyber Defense Pact",
                "What if all nations unite against cyber threats?",
                ScenarioCategory::Policy,
                "\u{1f6e1}\u{fe0f}",
                &[("cyberAttacks", -70, 0), ("cooperation", 90, 0), ("techInvestment", 500, 0)],
            ),
        ];

        let templates = BTreeMap::from([
            ("climate-action", CLIMATE_ACTION),
            ("peace-treaty", PEACE_TREATY),
            ("economic-cooperation", ECONOMIC_COOPERATION),
        ]);

        Self {
            scenarios,
            templates,
        }
    }

    /// All scenarios in display order.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Look up a scenario by id.
    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Slider ranges for every parameter of `id`.
    pub fn parameter_ranges(&self, id: &str) -> Option<BTreeMap<String, ParameterRange>> {
        self.get(id).map(|s| {
            s.base_parameters
                .iter()
                .map(|(name, &default)| (name.clone(), parameter_range(default)))
                .collect()
        })
    }

    /// Clamp a single override. `None` when the scenario or parameter is unknown.
    pub fn clamp_value(&self, id: &str, name: &str, value: Decimal) -> Option<Decimal> {
        let default = *self.get(id)?.base_parameters.get(name)?;
        let range = parameter_range(default);
        Some(value.clamp(range.min, range.max))
    }

    /// Clamp every override into range, dropping names the scenario lacks.
    pub fn clamp_overrides(&self, id: &str, overrides: &ParameterSet) -> ParameterSet {
        overrides
            .iter()
            .filter_map(|(name, &value)| {
                let clamped = self.clamp_value(id, name, value);
                if clamped.is_none() {
                    debug!(scenario = id, parameter = %name, "Dropping unknown parameter override");
                }
                clamped.map(|v| (name.clone(), v))
            })
            .collect()
    }

    /// Base parameters of `id` with `overrides` applied on top.
    pub fn merge(&self, id: &str, overrides: &ParameterSet) -> ParameterSet {
        let mut merged = self
            .get(id)
            .map(|s| s.base_parameters.clone())
            .unwrap_or_default();
        merged.extend(overrides.iter().map(|(k, &v)| (k.clone(), v)));
        merged
    }

    /// The static outcome report for `id`.
    ///
    /// Unknown ids get the generic report titled with the requested id.
    pub fn report(&self, id: &str) -> OutcomeReport {
        let title = self.get(id).map_or(id, |s| s.title.as_str());
        self.templates.get(id).unwrap_or(&GENERIC).report(title)
    }
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn scenario(
    id: &str,
    title: &str,
    description: &str,
    category: ScenarioCategory,
    icon: &str,
    parameters: &[(&str, i64, u32)],
) -> Scenario {
    Scenario {
        id: id.to_owned(),
        title: title.to_owned(),
        description: description.to_owned(),
        category,
        icon: icon.to_owned(),
        base_parameters: parameters
            .iter()
            .map(|&(name, num, scale)| (name.to_owned(), Decimal::new(num, scale)))
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    #[test]
    fn standard_catalog_has_five_scenarios() {
        let catalog = ScenarioCatalog::standard();
        let ids: Vec<&str> = catalog.scenarios().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "climate-action",
                "peace-treaty",
                "economic-cooperation",
                "renewable-transition",
                "cyber-security"
            ]
        );
        let climate = catalog.get("climate-action").unwrap();
        assert_eq!(climate.base_parameters.get("economicImpact"), Some(&dec(-25, 1)));
    }

    #[test]
    fn bespoke_reports() {
        let catalog = ScenarioCatalog::standard();
        let climate = catalog.report("climate-action");
        assert_eq!(climate.probability_percent, 75);
        assert_eq!(climate.timeframe_label, "10-15 years");
        assert_eq!(climate.global_impact_score, dec(85, 1));
        assert_eq!(climate.scenario_title, "Global Carbon Tax Implementation");
        assert_eq!(climate.positive_outcomes.len(), 4);

        let peace = catalog.report("peace-treaty");
        assert_eq!((peace.probability_percent, peace.timeframe_label.as_str()), (65, "2-5 years"));
        let trade = catalog.report("economic-cooperation");
        assert_eq!(trade.global_impact_score, dec(68, 1));
    }

    #[test]
    fn catalog_scenarios_without_template_use_generic() {
        let catalog = ScenarioCatalog::standard();
        let report = catalog.report("cyber-security");
        assert_eq!(report.probability_percent, 60);
        assert_eq!(report.scenario_title, "Global Cyber Defense Pact");
    }

    #[test]
    fn unknown_id_gets_generic_report() {
        let catalog = ScenarioCatalog::standard();
        let report = catalog.report("asteroid-impact");
        assert_eq!(report.probability_percent, 60);
        assert_eq!(report.timeframe_label, "5-10 years");
        assert_eq!(report.global_impact_score, dec(50, 1));
        assert_eq!(report.scenario_title, "asteroid-impact");
        assert!(!report.positive_outcomes.is_empty());
        assert!(!report.negative_outcomes.is_empty());
        assert!(!report.neutral_outcomes.is_empty());
    }

    #[test]
    fn overrides_are_clamped() {
        let catalog = ScenarioCatalog::standard();
        assert_eq!(
            catalog.clamp_value("climate-action", "carbonTax", dec(500, 0)),
            Some(dec(150, 0))
        );
        assert_eq!(
            catalog.clamp_value("climate-action", "carbonTax", dec(10, 0)),
            Some(dec(50, 0))
        );
        assert_eq!(
            catalog.clamp_value("climate-action", "carbonTax", dec(120, 0)),
            Some(dec(120, 0))
        );
    }

    #[test]
    fn negative_defaults_clamp_into_ordered_range() {
        let catalog = ScenarioCatalog::standard();
        // economicImpact default -2.5 -> range [-3.75, -1.25]
        assert_eq!(
            catalog.clamp_value("climate-action", "economicImpact", dec(0, 0)),
            Some(dec(-125, 2))
        );
        assert_eq!(
            catalog.clamp_value("climate-action", "economicImpact", dec(-10, 0)),
            Some(dec(-375, 2))
        );
    }

    #[test]
    fn unknown_parameters_are_dropped() {
        let catalog = ScenarioCatalog::standard();
        let overrides = ParameterSet::from([
            (String::from("carbonTax"), dec(500, 0)),
            (String::from("moonBase"), dec(1, 0)),
        ]);
        let clamped = catalog.clamp_overrides("climate-action", &overrides);
        assert_eq!(clamped, ParameterSet::from([(String::from("carbonTax"), dec(150, 0))]));
        assert!(catalog.clamp_overrides("unknown", &overrides).is_empty());
    }

    #[test]
    fn merge_overrides_win() {
        let catalog = ScenarioCatalog::standard();
        let overrides = ParameterSet::from([(String::from("compliance"), dec(90, 0))]);
        let merged = catalog.merge("climate-action", &overrides);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("compliance"), Some(&dec(90, 0)));
        assert_eq!(merged.get("carbonTax"), Some(&dec(100, 0)));
    }

    #[test]
    fn parameter_steps() {
        assert_eq!(parameter_range(dec(100, 0)).step, Decimal::ONE);
        assert_eq!(parameter_range(dec(-70, 0)).step, Decimal::ONE);
        assert_eq!(parameter_range(dec(32, 1)).step, dec(1, 1));
        assert_eq!(parameter_range(dec(10, 0)).step, dec(1, 1));

        let ranges = ScenarioCatalog::standard().parameter_ranges("peace-treaty").unwrap();
        let refugees = ranges.get("refugeeReturn").unwrap();
        assert_eq!((refugees.min, refugees.max), (dec(30, 0), dec(90, 0)));
    }
}
