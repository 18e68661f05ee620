//! Plain-text rendering of an optimization result.

use std::fmt::Write;

use nutriplan_core::catalog::CATALOG;
use nutriplan_core::model::{
    Convergence, InteractionKind, OptimizationRequest, OptimizationResult,
};

/// `$1,234.56` with thousands separators, sign ahead of the dollar sign.
fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let dollars = cents / 100;
    let fraction = cents % 100;

    let digits = dollars.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

fn kind_label(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::Synergistic => "synergistic",
        InteractionKind::Antagonistic => "antagonistic",
        InteractionKind::Independent => "independent",
        InteractionKind::Competitive => "competitive",
    }
}

fn convergence_label(convergence: Convergence) -> &'static str {
    match convergence {
        Convergence::Converged => "converged",
        Convergence::Partial => "hit iteration cap",
        Convergence::Fallback => "fallback",
    }
}

pub fn render(request: &OptimizationRequest, result: &OptimizationResult) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Fertilizer plan: {} ({}, {:.1} ac)",
        request.field_id, request.crop, request.field_size_acres
    );
    let _ = writeln!(
        out,
        "Catalog {} | generated {}",
        result.catalog_version,
        result.generated_at.strftime("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Application rates (lb/acre):");
    for (nutrient, rate) in &result.rates {
        let cost = rate * CATALOG.unit_cost(*nutrient);
        let _ = writeln!(
            out,
            "  {:<4} {:<12} {:>7.1}   ${:>7.2}",
            nutrient.symbol(),
            nutrient.to_string(),
            rate,
            cost
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Expected yield: {:.1} {} of {:.1} targeted ({:.0}% confidence)",
        result.expected_yield,
        request.yield_unit,
        request.target_yield,
        result.yield_confidence * 100.0
    );

    let economics = &result.economics;
    let _ = writeln!(
        out,
        "Per acre: cost {}, revenue {}, net {}, ROI {:.1}%",
        format_currency(economics.total_cost),
        format_currency(economics.expected_revenue),
        format_currency(economics.net_profit),
        economics.roi_percent
    );
    if request.field_size_acres != 1.0 {
        let acres = request.field_size_acres;
        let _ = writeln!(
            out,
            "Whole field ({acres:.1} ac): cost {}, net {}",
            format_currency(economics.total_cost * acres),
            format_currency(economics.net_profit * acres)
        );
    }
    if let Some(budget) = request.budget {
        let corrected = if result.solver.budget_corrected {
            " (rates rescaled to fit)"
        } else {
            ""
        };
        let _ = writeln!(out, "Budget: {} per acre{corrected}", format_currency(budget));
    }
    let _ = writeln!(out);

    if !result.active_interactions.is_empty() {
        let _ = writeln!(out, "Active interactions:");
        for interaction in &result.active_interactions {
            let (a, b) = interaction.pair;
            let _ = writeln!(
                out,
                "  {}-{} {}: {:+.2} {}",
                a.symbol(),
                b.symbol(),
                kind_label(interaction.kind),
                interaction.net_effect,
                request.yield_unit
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Risk score: {:.2}", result.risk.score);
    for factor in &result.risk.factors {
        let _ = writeln!(out, "  - {factor}");
    }
    if !result.risk.factors.is_empty() {
        let _ = writeln!(out);
    }

    if !result.recommendations.is_empty() {
        let _ = writeln!(out, "Recommendations:");
        for recommendation in &result.recommendations {
            let _ = writeln!(out, "  - {recommendation}");
        }
        let _ = writeln!(out);
    }

    if !result.alternatives.is_empty() {
        let _ = writeln!(out, "Alternatives:");
        for alternative in &result.alternatives {
            let _ = writeln!(
                out,
                "  {:<14} yield {:.1} {} at ${:.2}/ac  ({})",
                alternative.name,
                alternative.projected_yield,
                request.yield_unit,
                alternative.projected_cost,
                alternative.description
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Solver: {} ({}, {} iterations, {:.1} ms)",
        result.solver.method,
        convergence_label(result.solver.convergence),
        result.solver.iterations,
        result.solver.elapsed_ms
    );

    out
}

#[cfg(test)]
mod tests {
    use nutriplan_core::Engine;
    use nutriplan_core::model::{Nutrient, RequestBuilder};

    use super::*;

    fn corn_request() -> OptimizationRequest {
        RequestBuilder::new("north-40", "corn")
            .sampled(jiff::civil::date(2026, 3, 14))
            .target_yield(180.0)
            .soil_ph(6.5)
            .organic_matter(3.2)
            .field_size(120.0)
            .soil_test(Nutrient::Nitrogen, 25.0)
            .soil_test(Nutrient::Phosphorus, 15.0)
            .soil_test(Nutrient::Potassium, 120.0)
            .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
            .requirement(Nutrient::Phosphorus, 30.0, (40.0, 80.0), 0.25)
            .requirement(Nutrient::Potassium, 80.0, (100.0, 150.0), 0.60)
            .limit(Nutrient::Nitrogen, 200.0)
            .limit(Nutrient::Phosphorus, 100.0)
            .limit(Nutrient::Potassium, 200.0)
            .budget(150.0)
            .build()
    }

    #[test]
    fn test_render_covers_every_section() {
        let request = corn_request();
        let result = Engine::default().optimize(&request).unwrap();
        let text = render(&request, &result);

        assert!(text.contains("Fertilizer plan: north-40"));
        assert!(text.contains("Application rates"));
        assert!(text.contains("nitrogen"));
        assert!(text.contains("Expected yield"));
        assert!(text.contains("Whole field (120.0 ac)"));
        assert!(text.contains("Budget: $150.00"));
        assert!(text.contains("Risk score"));
        assert!(text.contains("Alternatives:"));
        assert!(text.contains("Solver:"));
    }

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(17724.5), "$17,724.50");
        assert_eq!(format_currency(-950.25), "-$950.25");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
    }

    #[test]
    fn test_render_skips_field_scaling_for_single_acre() {
        let mut request = corn_request();
        request.field_size_acres = 1.0;
        let result = Engine::default().optimize(&request).unwrap();
        let text = render(&request, &result);
        assert!(!text.contains("Whole field"));
    }
}
