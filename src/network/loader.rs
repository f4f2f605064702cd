use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv::{ByteRecord, ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::GraphContext;
use super::link::{EdgeKey, Link};
use crate::primitives::NodeRegistry;
use crate::types::{GraphletError, Result};

/// How a ranked edge list is parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Column separator; records without it fall back to whitespace splitting.
    pub delimiter: char,
    /// Stop after this many accepted links.
    pub max_links: Option<usize>,
    /// Abort on the first bad record instead of dropping it.
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            max_links: None,
            strict: false,
        }
    }
}

impl LoadOptions {
    /// Sets the column separator.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Caps the number of accepted links.
    pub fn max_links(mut self, max: usize) -> Self {
        self.max_links = Some(max);
        self
    }

    /// Turns dropped records into errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                GraphletError::Config(format!(
                    "delimiter {:?} is not a single ASCII character",
                    self.delimiter
                ))
            })
    }
}

/// Tally of what a load accepted and dropped.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadReport {
    /// Links inserted into the context.
    pub accepted: usize,
    /// Records whose two labels were equal.
    pub self_loops: usize,
    /// Records repeating an earlier link.
    pub duplicates: usize,
    /// Records without two usable labels.
    pub malformed: usize,
}

impl LoadReport {
    /// Records dropped for any reason.
    pub fn dropped(&self) -> usize {
        self.self_loops + self.duplicates + self.malformed
    }
}

struct Builder {
    graph: GraphContext,
    report: LoadReport,
    strict: bool,
    max_links: Option<usize>,
}

impl Builder {
    fn new(registry: Arc<NodeRegistry>, strict: bool, max_links: Option<usize>) -> Self {
        Self {
            graph: GraphContext::new(registry),
            report: LoadReport::default(),
            strict,
            max_links,
        }
    }

    fn is_full(&self) -> bool {
        self.max_links
            .is_some_and(|max| self.report.accepted >= max)
    }

    fn push(&mut self, line: u64, source: &str, target: &str) -> Result<()> {
        if source.is_empty() || target.is_empty() {
            return self.drop_record(GraphletError::Malformed {
                line,
                reason: "empty label",
            });
        }
        if source == target {
            return self.drop_record(GraphletError::SelfLoop {
                label: source.to_string(),
            });
        }
        let registry = self.graph.registry().clone();
        let key = EdgeKey::new(registry.intern(source), registry.intern(target));
        if let Err(err) = self.graph.check_insertable(key) {
            return self.drop_record(err);
        }
        let rank = self.report.accepted + 1;
        self.graph
            .add_edge(Link::ranked(key.source, key.target, rank))?;
        self.report.accepted += 1;
        Ok(())
    }

    fn drop_record(&mut self, err: GraphletError) -> Result<()> {
        if self.strict {
            return Err(err);
        }
        match err {
            GraphletError::SelfLoop { .. } => self.report.self_loops += 1,
            GraphletError::DuplicateEdge { .. } => self.report.duplicates += 1,
            _ => self.report.malformed += 1,
        }
        warn!(error = %err, "loader.record.dropped");
        Ok(())
    }

    fn finish(self) -> (GraphContext, LoadReport) {
        debug!(
            context = self.graph.id().0,
            accepted = self.report.accepted,
            dropped = self.report.dropped(),
            nodes = self.graph.node_count(),
            "loader.done"
        );
        (self.graph, self.report)
    }
}

/// Builds a context from labelled pairs, ranked by position among accepted pairs.
pub fn load_pairs<I, S, T>(registry: Arc<NodeRegistry>, pairs: I) -> Result<(GraphContext, LoadReport)>
where
    I: IntoIterator<Item = (S, T)>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let mut builder = Builder::new(registry, false, None);
    for (line, (source, target)) in pairs.into_iter().enumerate() {
        builder.push(line as u64 + 1, source.as_ref().trim(), target.as_ref().trim())?;
    }
    Ok(builder.finish())
}

/// Parses a ranked edge list, one `source<delim>target` record per line.
///
/// Quotes are stripped, extra columns ignored and blank lines skipped.
pub fn load_reader<R: Read>(
    registry: Arc<NodeRegistry>,
    reader: R,
    options: &LoadOptions,
) -> Result<(GraphContext, LoadReport)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(options.delimiter_byte()?)
        .from_reader(reader);
    let mut builder = Builder::new(registry, options.strict, options.max_links);
    let mut record = ByteRecord::new();
    while !builder.is_full() && reader.read_byte_record(&mut record)? {
        let line = record.position().map_or(0, |pos| pos.line());
        if record.iter().all(<[u8]>::is_empty) {
            continue;
        }
        let fields: Option<Vec<&str>> = record
            .iter()
            .map(|field| std::str::from_utf8(field).ok())
            .collect();
        let Some(fields) = fields else {
            builder.drop_record(GraphletError::Malformed {
                line,
                reason: "invalid utf-8",
            })?;
            continue;
        };
        match split_labels(&fields) {
            Some((source, target)) => builder.push(line, &source, &target)?,
            None => builder.drop_record(GraphletError::Malformed {
                line,
                reason: "expected two labels",
            })?,
        }
    }
    Ok(builder.finish())
}

/// Opens `path` and parses it with [`load_reader`].
pub fn load_path(
    registry: Arc<NodeRegistry>,
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<(GraphContext, LoadReport)> {
    let file = File::open(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "loader.open");
    load_reader(registry, file, options)
}

fn split_labels(fields: &[&str]) -> Option<(String, String)> {
    let clean = |s: &str| s.trim().trim_matches('"').trim().to_string();
    if let [source, target, ..] = fields {
        return Some((clean(*source), clean(*target)));
    }
    let mut parts = fields.first()?.split_whitespace();
    let source = parts.next()?;
    let target = parts.next()?;
    Some((clean(source), clean(target)))
}
