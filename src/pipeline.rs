use std::io::Write;

use anyhow::Context;
use tracing::debug;

use crate::{
    config::Config,
    downloader::{Document, Downloader},
    format::format,
    parser::{ExtractedReference, Parser},
    resolver::resolve,
};

/// One run over a single document: fetch it, extract the references, then
/// filter, resolve and print them in document order.
#[derive(Debug)]
pub(crate) struct Pipeline {
    config: Config,
    downloader: Downloader,
}

impl Pipeline {
    pub(crate) fn new(config: Config) -> anyhow::Result<Self> {
        let downloader = Downloader::new(&config.fetch)?;

        Ok(Self { config, downloader })
    }

    /// Run the whole pipeline, writing one line per surviving reference to `out`.
    /// Returns the number of lines written.
    pub(crate) async fn run(&self, out: &mut impl Write) -> anyhow::Result<usize> {
        let document = self
            .downloader
            .download(&self.config.url)
            .await
            .with_context(|| format!("failed to fetch {}", self.config.url))?;

        self.process(&document, out)
    }

    /// Scan an already retrieved `document`.
    pub(crate) fn process(&self, document: &Document, out: &mut impl Write) -> anyhow::Result<usize> {
        let parser = Parser::new(&document.html, &self.config.tag)?;
        let mut emitted = 0;

        for reference in parser.extract(&self.config.attribute) {
            debug!("URL extracted: {}", reference.raw_value);

            if let Some(line) = self.line_for(document, &reference) {
                writeln!(out, "{}", line)?;
                out.flush()?;
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// The output line for `reference`, or `None` when it is filtered out.
    fn line_for(&self, document: &Document, reference: &ExtractedReference) -> Option<String> {
        if !self.config.filter.passes(reference) {
            return None;
        }

        let value = if self.config.fix_links {
            match resolve(&document.location, &reference.raw_value) {
                Ok(fixed) => {
                    debug!("URL fixed into: {}", fixed);
                    fixed
                }
                Err(e) => {
                    debug!(
                        "\"{}\" can't be fixed, passing it along as it is: {}",
                        reference.raw_value, e
                    );
                    reference.raw_value.clone()
                }
            }
        } else {
            reference.raw_value.clone()
        };

        Some(format(reference, &value, self.config.template.as_ref()))
    }
}
