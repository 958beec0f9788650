//! Prometheus counters exposed at `/metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct FileTypeLabels {
    pub file_type: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StatusLabels {
    pub status: u16,
}

pub struct Metrics {
    registry: Registry,
    uploads: Family<FileTypeLabels, Counter>,
    searches: Counter,
    http_errors: Family<StatusLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("repositorio");
        let uploads = Family::<FileTypeLabels, Counter>::default();
        let searches = Counter::default();
        let http_errors = Family::<StatusLabels, Counter>::default();

        registry.register("materials_uploaded", "Materials uploaded, by file type", uploads.clone());
        registry.register("material_searches", "Material searches served", searches.clone());
        registry.register("http_errors", "Error responses, by status code", http_errors.clone());

        Self {
            registry,
            uploads,
            searches,
            http_errors,
        }
    }

    pub fn upload(&self, file_type: &str) {
        self.uploads
            .get_or_create(&FileTypeLabels {
                file_type: file_type.to_string(),
            })
            .inc();
    }

    pub fn search(&self) {
        self.searches.inc();
    }

    pub fn http_error(&self, status: u16) {
        self.http_errors.get_or_create(&StatusLabels { status }).inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = Metrics::new();
        metrics.upload("ZIP");
        metrics.upload("ZIP");
        metrics.search();
        metrics.http_error(404);

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"repositorio_materials_uploaded_total{file_type="ZIP"} 2"#));
        assert!(text.contains("repositorio_material_searches_total 1"));
        assert!(text.contains(r#"repositorio_http_errors_total{status="404"} 1"#));
    }
}
