//! Extraction over every page of every input.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::OmrResult;
use crate::domain::ExtractionResult;
use crate::extract::FieldExtractor;
use crate::ingest::{InputKind, PageIngestor, PageSource};

/// One page's result and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedPage {
    pub source: PageSource,
    pub result: ExtractionResult,
}

/// `{"extractedData": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    #[serde(rename = "extractedData")]
    pub extracted_data: Vec<ExtractionResult>,
}

impl From<Vec<ExtractedPage>> for ExtractResponse {
    fn from(pages: Vec<ExtractedPage>) -> Self {
        Self {
            extracted_data: pages.into_iter().map(|page| page.result).collect(),
        }
    }
}

/// Drives ingestion and extraction over a list of inputs.
pub struct BatchAggregator {
    ingestor: PageIngestor,
    extractor: FieldExtractor,
}

impl BatchAggregator {
    pub fn new(ingestor: PageIngestor, extractor: FieldExtractor) -> Self {
        Self {
            ingestor,
            extractor,
        }
    }

    /// Extracts every page of every input, in input order.
    ///
    /// All inputs are classified before any is read, so an unsupported
    /// top-level format fails the whole batch without producing anything.
    /// Once processing starts, a page or archive that cannot be read becomes
    /// a result with `error` set and the batch carries on.
    pub fn run<P: AsRef<Path>>(&self, inputs: &[P]) -> OmrResult<Vec<ExtractedPage>> {
        for input in inputs {
            InputKind::classify(input.as_ref())?;
        }

        let mut pages = Vec::new();
        for input in inputs {
            let input = input.as_ref();
            let before = pages.len();
            self.ingestor.for_each_page(input, &mut |source, page| {
                let result = match page {
                    Ok(raster) => self.extractor.extract(&raster),
                    Err(e) => {
                        let message = e.to_report_string();
                        warn!("{source}: {message}");
                        ExtractionResult::failed(message)
                    }
                };
                pages.push(ExtractedPage { source, result });
            })?;
            info!("{}: {} page(s)", input.display(), pages.len() - before);
        }
        Ok(pages)
    }

    /// Runs the batch and shapes the result as the extraction response.
    pub fn run_response(&self, inputs: &[PathBuf]) -> OmrResult<ExtractResponse> {
        self.run(inputs).map(ExtractResponse::from)
    }
}
