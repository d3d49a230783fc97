//! Output formatting for matched niches (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::seller::NicheResult;

/// Formats niche results for output.
pub struct Formatter {
    format: OutputFormat,
    portal_url: Option<String>,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format, portal_url: None }
    }

    /// Adds links to each niche's page on the given seller portal.
    pub fn with_portal(mut self, portal_url: impl Into<String>) -> Self {
        self.portal_url = Some(portal_url.into());
        self
    }

    /// Formats all results.
    pub fn format_results(&self, results: &[NicheResult]) -> String {
        if results.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No niches found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_results(results),
            OutputFormat::Table => self.table_results(results),
            OutputFormat::Markdown => self.markdown_results(results),
            OutputFormat::Csv => self.csv_results(results),
        }
    }

    fn link(&self, result: &NicheResult) -> Option<String> {
        self.portal_url.as_deref().map(|url| result.portal_link(url))
    }

    // JSON formatting

    fn json_results(&self, results: &[NicheResult]) -> String {
        serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_results(&self, results: &[NicheResult]) -> String {
        let volume_width = 12;
        let growth_width = 8;
        let units_width = 10;
        let price_width = 9;
        let reviews_width = 8;
        let title_width = 40;

        let mut lines = Vec::new();

        let row = |cells: [&str; 5], title: &str| {
            format!(
                "{:>volume_width$}  {:>growth_width$}  {:>units_width$}  \
                 {:>price_width$}  {:>reviews_width$}  {}",
                cells[0], cells[1], cells[2], cells[3], cells[4], title
            )
        };

        lines.push(row(["Volume", "Growth", "Units", "Price", "Reviews"], "Niche"));
        lines.push(format!(
            "{:-<volume_width$}  {:-<growth_width$}  {:-<units_width$}  \
             {:-<price_width$}  {:-<reviews_width$}  {:-<title_width$}",
            "", "", "", "", "", ""
        ));

        for result in results {
            lines.push(row(
                [
                    format!("{:.0}", result.total_search_volumes).as_str(),
                    format!("{:.1}%", result.growth_percentage).as_str(),
                    format!("{:.0}", result.total_units_sold).as_str(),
                    format!("{:.2}", result.avg_price).as_str(),
                    format!("{:.0}", result.avg_reviews_number).as_str(),
                ],
                &truncate(&result.niche_title, title_width),
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} niches", results.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_results(&self, results: &[NicheResult]) -> String {
        let mut lines = Vec::new();

        lines.push(
            "| Niche | Volume | Growth | Units | Price | Reviews | Launched | Successful |".into(),
        );
        lines.push(
            "|-------|--------|--------|-------|-------|---------|----------|------------|".into(),
        );

        for result in results {
            let title = truncate(&result.niche_title, 40).replace('|', "\\|");
            let niche = match self.link(result) {
                Some(link) => format!("[{}]({})", title, link),
                None => title,
            };

            lines.push(format!(
                "| {} | {:.0} | {:.1}% | {:.0} | {:.2} | {:.0} | {:.0} | {:.0} |",
                niche,
                result.total_search_volumes,
                result.growth_percentage,
                result.total_units_sold,
                result.avg_price,
                result.avg_reviews_number,
                result.new_products_launched,
                result.successful_products_launched
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} niches found*", results.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        let mut header = [
            "nicheId",
            "nicheTitle",
            "totalSearchVolumes",
            "growthPercentage",
            "totalUnitsSold",
            "avgPrice",
            "avgReviewsNumber",
            "newProductsLaunched",
            "successfulProductsLaunched",
        ]
        .join(",");
        if self.portal_url.is_some() {
            header.push_str(",link");
        }
        header
    }

    fn csv_results(&self, results: &[NicheResult]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for result in results {
            let mut line = format!(
                "{},{},{},{},{},{},{},{},{}",
                Self::csv_escape(&result.niche_id),
                Self::csv_escape(&result.niche_title),
                result.total_search_volumes,
                result.growth_percentage,
                result.total_units_sold,
                result.avg_price,
                result.avg_reviews_number,
                result.new_products_launched,
                result.successful_products_launched
            );
            if let Some(link) = self.link(result) {
                line.push(',');
                line.push_str(&link);
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() > width {
        let head: String = title.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}
