//! Natural-language commentary for a report.
//!
//! With a configured endpoint, one prompt per [`Section`] is sent to a
//! [`TextGenerator`] in sequence; a failed call only affects its own section.
//! Without one, [`prompts::basic_summary`] produces a fixed template.

pub mod client;
pub mod prompts;

pub use client::{ChatClient, ChatConfig, GenerationParams, TextGenerator};
pub use prompts::{basic_summary, NarrationInput};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// A section of the narrative report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    ExecutiveSummary,
    CompanyAnalysis,
    SectorInsights,
    RiskAnalysis,
    InvestmentRecommendations,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::ExecutiveSummary => write!(f, "Executive Summary"),
            Section::CompanyAnalysis => write!(f, "Company Analysis"),
            Section::SectorInsights => write!(f, "Sector Insights"),
            Section::RiskAnalysis => write!(f, "Risk Analysis"),
            Section::InvestmentRecommendations => write!(f, "Investment Recommendations"),
        }
    }
}

impl Section {
    /// All sections in report order.
    pub const ALL: [Section; 5] = [
        Section::ExecutiveSummary,
        Section::CompanyAnalysis,
        Section::SectorInsights,
        Section::RiskAnalysis,
        Section::InvestmentRecommendations,
    ];

    pub fn params(&self) -> GenerationParams {
        let (max_tokens, temperature) = match self {
            Section::ExecutiveSummary => (400, 0.7),
            Section::CompanyAnalysis => (350, 0.6),
            Section::SectorInsights => (300, 0.6),
            Section::RiskAnalysis => (350, 0.7),
            Section::InvestmentRecommendations => (350, 0.6),
        };
        GenerationParams {
            max_tokens,
            temperature,
        }
    }

    /// Prefix for the degraded text when the remote call fails.
    fn failure_label(&self) -> &'static str {
        match self {
            Section::ExecutiveSummary => "Executive summary",
            Section::CompanyAnalysis => "Company analysis",
            Section::SectorInsights => "Sector analysis",
            Section::RiskAnalysis => "Risk assessment",
            Section::InvestmentRecommendations => "Investment recommendations",
        }
    }

    /// Text used when the section has no data to send.
    fn no_data_message(&self) -> String {
        match self {
            Section::SectorInsights => {
                "Sector analysis not available - insufficient sector data.".to_string()
            }
            _ => format!("{} not available - insufficient data.", self.failure_label()),
        }
    }
}

/// One generated passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeSection {
    pub section: Section,
    pub text: String,
    /// False when the text is a fallback rather than model output.
    pub generated: bool,
}

/// The commentary attached to a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Narrative {
    Remote {
        model: String,
        sections: Vec<NarrativeSection>,
    },
    Template {
        summary: String,
    },
}

impl Narrative {
    /// Short description of how the text was produced.
    pub fn mode_label(&self) -> String {
        match self {
            Narrative::Remote { model, .. } => model.clone(),
            Narrative::Template { .. } => "template".to_string(),
        }
    }
}

/// Produces a [`Narrative`] from aggregator output.
pub struct Narrator {
    generator: Option<Box<dyn TextGenerator>>,
    show_progress: bool,
}

impl Narrator {
    /// Narrator backed by a remote text generator.
    pub fn remote(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
            show_progress: false,
        }
    }

    /// Narrator that never calls out and uses the fixed template.
    pub fn template() -> Self {
        Self {
            generator: None,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn narrate(&self, input: &NarrationInput<'_>) -> Narrative {
        let Some(generator) = self.generator.as_deref() else {
            info!("No text-generation endpoint configured, using template summary");
            return Narrative::Template {
                summary: basic_summary(input.summary),
            };
        };

        let mut sections = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            sections.push(self.narrate_section(generator, section, input).await);
        }

        Narrative::Remote {
            model: generator.model().to_string(),
            sections,
        }
    }

    async fn narrate_section(
        &self,
        generator: &dyn TextGenerator,
        section: Section,
        input: &NarrationInput<'_>,
    ) -> NarrativeSection {
        let Some(prompt) = prompts::section_prompt(section, input) else {
            info!("{}: no data, skipping remote call", section);
            return NarrativeSection {
                section,
                text: section.no_data_message(),
                generated: false,
            };
        };

        let spinner = self.spinner(section);
        let result = generator.generate(&prompt, section.params()).await;
        spinner.finish_and_clear();

        match result {
            Ok(text) => {
                info!("{}: generated {} characters", section, text.len());
                NarrativeSection {
                    section,
                    text,
                    generated: true,
                }
            }
            Err(e) => {
                warn!("{} failed: {}", section, e);
                NarrativeSection {
                    section,
                    text: format!("{} unavailable: {}", section.failure_label(), e),
                    generated: false,
                }
            }
        }
    }

    fn spinner(&self, section: Section) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Generating {}...", section));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        company_insights, risk_assessment, sector_insights, summarize, top_performers,
    };
    use crate::error::{ReportError, Result};
    use crate::loader::{sample_table, SampleDataset};
    use async_trait::async_trait;

    /// Echoes a fixed reply and fails for prompts containing `fail_on`.
    struct ScriptedGenerator {
        fail_on: Option<&'static str>,
    }

    impl ScriptedGenerator {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self { fail_on }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str, _params: GenerationParams) -> Result<String> {
            match self.fail_on {
                Some(marker) if prompt.contains(marker) => {
                    Err(ReportError::remote("rate limited"))
                }
                _ => Ok("Looks fine.".to_string()),
            }
        }
    }

    fn narrate_sample(narrator: &Narrator, dataset: SampleDataset) -> Narrative {
        let table = sample_table(dataset);
        let summary = summarize(&table);
        let companies = company_insights(&table);
        let sectors = sector_insights(&table);
        let risk = risk_assessment(&table);
        let top = top_performers(&table, "Net_Income", 5).unwrap();
        let input = NarrationInput {
            summary: &summary,
            companies: &companies,
            sectors: &sectors,
            risk: &risk,
            top_performers: &top,
        };
        tokio_test::block_on(narrator.narrate(&input))
    }

    fn sections(narrative: Narrative) -> Vec<NarrativeSection> {
        match narrative {
            Narrative::Remote { sections, .. } => sections,
            Narrative::Template { .. } => panic!("expected remote narrative"),
        }
    }

    #[test]
    fn test_five_sections_in_order() {
        let narrator = Narrator::remote(Box::new(ScriptedGenerator::new(None)));
        let sections = sections(narrate_sample(&narrator, SampleDataset::Mixed));

        let order: Vec<Section> = sections.iter().map(|s| s.section).collect();
        assert_eq!(order, Section::ALL.to_vec());
        assert!(sections.iter().all(|s| s.generated && s.text == "Looks fine."));
    }

    #[test]
    fn test_failure_is_isolated_to_one_section() {
        let generator = ScriptedGenerator::new(Some("comprehensive risk assessment"));
        let narrator = Narrator::remote(Box::new(generator));
        let sections = sections(narrate_sample(&narrator, SampleDataset::Crisis));

        let risk = sections
            .iter()
            .find(|s| s.section == Section::RiskAnalysis)
            .unwrap();
        assert!(!risk.generated);
        assert_eq!(
            risk.text,
            "Risk assessment unavailable: Remote service error: rate limited"
        );

        let others: Vec<_> = sections
            .iter()
            .filter(|s| s.section != Section::RiskAnalysis)
            .collect();
        assert_eq!(others.len(), 4);
        assert!(others.iter().all(|s| s.generated));
    }

    #[test]
    fn test_sections_without_data_skip_the_call() {
        let generator = ScriptedGenerator::new(None);
        let narrator = Narrator::remote(Box::new(generator));
        let table = sample_table(SampleDataset::Tech);
        let summary = summarize(&table);
        let risk = risk_assessment(&table);
        let input = NarrationInput {
            summary: &summary,
            companies: &[],
            sectors: &[],
            risk: &risk,
            top_performers: &[],
        };

        let narrative = tokio_test::block_on(narrator.narrate(&input));
        let sections = sections(narrative);
        let sector = &sections[2];
        assert_eq!(sector.section, Section::SectorInsights);
        assert!(!sector.generated);
        assert_eq!(
            sector.text,
            "Sector analysis not available - insufficient sector data."
        );
        assert_eq!(
            sections[4].text,
            "Investment recommendations not available - insufficient data."
        );
    }

    #[test]
    fn test_params_match_section() {
        assert_eq!(Section::ExecutiveSummary.params().max_tokens, 400);
        assert_eq!(Section::SectorInsights.params().max_tokens, 300);
        assert_eq!(Section::RiskAnalysis.params().temperature, 0.7);
    }

    #[test]
    fn test_template_without_generator() {
        let narrator = Narrator::template();
        assert!(!narrator.is_remote());
        match narrate_sample(&narrator, SampleDataset::LargeCap) {
            Narrative::Template { summary } => {
                assert!(summary.contains("FINANCIAL PERFORMANCE SUMMARY"));
                assert!(summary.contains("Healthy revenue generation"));
            }
            Narrative::Remote { .. } => panic!("template narrator must not call out"),
        }
    }

    #[test]
    fn test_narrative_serializes_with_mode_tag() {
        let narrative = Narrative::Template {
            summary: "text".to_string(),
        };
        let json = serde_json::to_string(&narrative).unwrap();
        assert_eq!(json, r#"{"mode":"template","summary":"text"}"#);
        assert_eq!(narrative.mode_label(), "template");
    }
}
