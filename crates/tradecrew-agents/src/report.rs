//! Markdown rendering of a completed decision

use std::fmt::Write as _;
use tradecrew_core::TradingDecision;

/// Render a decision as a self-contained markdown document. Sections
/// that the (possibly degraded) run never filled in get an explicit
/// placeholder instead of being dropped.
pub fn render_markdown(decision: &TradingDecision) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "# Trading Analysis: {}\n\n*Analysis date: {} | Generated: {}*\n",
        decision.ticker,
        decision.analysis_date,
        decision.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    let _ = writeln!(
        out,
        "## Final Recommendation\n\n**{}** at **{:.0}%** confidence\n",
        decision.final_signal.as_str().to_uppercase(),
        decision.final_confidence
    );

    out.push_str("## Trader Summary\n\n");
    push_text(&mut out, &decision.trader_summary, "*No trader summary.*");

    out.push_str("## Risk Assessment\n\n");
    push_text(&mut out, &decision.risk_assessment, "*No risk assessment.*");

    out.push_str("## Verification\n\n");
    push_text(
        &mut out,
        &decision.verification_summary,
        "*No verification summary.*",
    );
    if !decision.verification_issues.is_empty() {
        out.push_str("Issues flagged:\n\n");
        for issue in &decision.verification_issues {
            let _ = writeln!(out, "- {issue}");
        }
        out.push('\n');
    }

    out.push_str("## Analyst Reports\n\n");
    if decision.analyst_reports.is_empty() {
        out.push_str("*No analyst reports.*\n\n");
    }
    for report in &decision.analyst_reports {
        let _ = writeln!(
            out,
            "### {} - {} ({:.0}%)\n\n{}\n",
            report.agent_role.display_name(),
            report.signal,
            report.confidence,
            report.summary.trim()
        );
    }

    out.push_str("## Debate History\n\n");
    if decision.debate_history.is_empty() {
        out.push_str("*No debate rounds.*\n\n");
    }
    for round in &decision.debate_history {
        let _ = writeln!(
            out,
            "### Round {}\n\n**Bull:** {}\n\n**Bear:** {}\n",
            round.round,
            round.bull.trim(),
            round.bear.trim()
        );
    }

    out.push_str("## Pipeline Steps\n\n");
    if decision.steps.is_empty() {
        out.push_str("*No step events recorded.*\n");
    }
    for step in &decision.steps {
        match &step.error {
            Some(error) => {
                let _ = writeln!(out, "- `{}`: {:?} ({})", step.step_name, step.status, error);
            }
            None => {
                let _ = writeln!(out, "- `{}`: {:?}", step.step_name, step.status);
            }
        }
    }

    out
}

fn push_text(out: &mut String, text: &str, placeholder: &str) {
    if text.trim().is_empty() {
        out.push_str(placeholder);
    } else {
        out.push_str(text.trim());
    }
    out.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tradecrew_core::{AgentRole, AnalysisResult, DebateRound, Signal};

    fn decision() -> TradingDecision {
        TradingDecision {
            ticker: "AAPL".to_string(),
            analysis_date: "2025-08-01".to_string(),
            final_signal: Signal::Buy,
            final_confidence: 72.0,
            trader_summary: "Accumulate on weakness.".to_string(),
            risk_assessment: String::new(),
            verification_summary: "Consistent.".to_string(),
            verification_issues: vec!["thin sentiment data".to_string()],
            analyst_reports: vec![AnalysisResult::new(
                AgentRole::TechnicalAnalyst,
                "AAPL",
                "Uptrend intact.",
                Signal::Buy,
                68.0,
            )],
            debate_history: vec![DebateRound {
                round: 1,
                bull: "Services growth.".to_string(),
                bear: "Hardware cycle risk.".to_string(),
            }],
            steps: Vec::new(),
            stock_info: HashMap::new(),
            indicators: HashMap::new(),
            signals: HashMap::new(),
            price_rows: 63,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_includes_all_sections() {
        let md = render_markdown(&decision());
        assert!(md.contains("# Trading Analysis: AAPL"));
        assert!(md.contains("**BUY** at **72%** confidence"));
        assert!(md.contains("Accumulate on weakness."));
        assert!(md.contains("*No risk assessment.*"));
        assert!(md.contains("- thin sentiment data"));
        assert!(md.contains("### Technical Analyst - buy (68%)"));
        assert!(md.contains("**Bull:** Services growth."));
    }

    #[test]
    fn test_empty_sections_get_placeholders() {
        let mut d = decision();
        d.analyst_reports.clear();
        d.debate_history.clear();
        d.trader_summary.clear();
        let md = render_markdown(&d);
        assert!(md.contains("*No trader summary.*"));
        assert!(md.contains("*No analyst reports.*"));
        assert!(md.contains("*No debate rounds.*"));
        assert!(md.contains("*No step events recorded.*"));
    }

    #[test]
    fn test_step_ledger_lists_errors() {
        let mut d = decision();
        d.steps.push(tradecrew_core::StepResult::completed("fetch_data"));
        d.steps
            .push(tradecrew_core::StepResult::error("research_debate", "timeout"));
        let md = render_markdown(&d);
        assert!(md.contains("- `fetch_data`: Completed"));
        assert!(md.contains("- `research_debate`: Error (timeout)"));
    }
}
