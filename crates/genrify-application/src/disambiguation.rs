// SPDX-License-Identifier: GPL-3.0-or-later

//! Narrowing a multi-result album search down to one release.

use crate::error::{ProviderError, ProviderResult};
use genrify_domain::{Candidate, SourceKind};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Candidates within this many years of the release year survive narrowing.
pub const YEAR_TOLERANCE: i32 = 2;

/// Outcome of asking a resolver to pick a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Use the candidate at this index.
    Pick(usize),
    /// The operator chose none of them.
    Skip,
    /// The resolver does not decide; the search counts as ambiguous.
    Decline,
}

/// Strategy for choosing between several remaining candidates.
pub trait CandidateResolver: Send + Sync {
    fn resolve(&self, source: SourceKind, candidates: &[Candidate]) -> Choice;
}

/// Unattended policy: ambiguity is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailOnAmbiguity;

impl CandidateResolver for FailOnAmbiguity {
    fn resolve(&self, _source: SourceKind, _candidates: &[Candidate]) -> Choice {
        Choice::Decline
    }
}

/// Asks an operator through a line-based prompt.
///
/// Candidates are listed with 1-based numbers; `0` skips. Anything else is
/// asked again, end of input counts as skip.
pub struct PromptResolver<R, W> {
    io: Mutex<(R, W)>,
}

impl<R, W> PromptResolver<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }

    fn prompt(input: &mut R, output: &mut W, source: SourceKind, candidates: &[Candidate]) -> io::Result<Choice> {
        writeln!(
            output,
            "Multiple releases found on {}, please choose the right one:",
            source
        )?;
        for (index, candidate) in candidates.iter().enumerate() {
            writeln!(output, "#{:2}: {}", index + 1, candidate)?;
        }

        loop {
            write!(output, "Choose Release # (0 to skip): ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(Choice::Skip);
            }

            match line.trim().parse::<usize>() {
                Ok(0) => return Ok(Choice::Skip),
                Ok(n) if n <= candidates.len() => return Ok(Choice::Pick(n - 1)),
                _ => continue,
            }
        }
    }
}

impl PromptResolver<BufReader<Stdin>, Stdout> {
    /// Prompt on the process's terminal.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> CandidateResolver for PromptResolver<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn resolve(&self, source: SourceKind, candidates: &[Candidate]) -> Choice {
        let mut guard = match self.io.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (input, output) = &mut *guard;
        Self::prompt(input, output, source, candidates).unwrap_or_else(|error| {
            warn!(target: "disambiguation", %error, "prompt failed, skipping");
            Choice::Skip
        })
    }
}

/// Reduces search results to the single release tags are taken from.
#[derive(Clone)]
pub struct Disambiguator {
    resolver: Arc<dyn CandidateResolver>,
}

impl Disambiguator {
    pub fn new(resolver: Arc<dyn CandidateResolver>) -> Self {
        Self { resolver }
    }

    /// Pick exactly one item.
    ///
    /// With more than one item and a known `year`, only items within two
    /// years remain. If several still remain, the resolver decides. No item
    /// left, or a skip, is [`ProviderError::NoTags`]; a declined choice is
    /// [`ProviderError::TooManyResults`].
    pub fn pick<T>(
        &self,
        source: SourceKind,
        items: Vec<T>,
        year: Option<i32>,
        candidate: impl Fn(&T) -> Candidate,
    ) -> ProviderResult<T> {
        let mut entries: Vec<(T, Candidate)> = items
            .into_iter()
            .map(|item| {
                let c = candidate(&item);
                (item, c)
            })
            .collect();

        if entries.len() > 1 {
            if let Some(year) = year {
                entries.retain(|(_, c)| c.near_year(year, YEAR_TOLERANCE));
                debug!(
                    target: "disambiguation",
                    %source,
                    year,
                    remaining = entries.len(),
                    "narrowed by year"
                );
            }
        }

        if entries.len() > 1 {
            let candidates: Vec<Candidate> = entries.iter().map(|(_, c)| c.clone()).collect();
            return match self.resolver.resolve(source, &candidates) {
                Choice::Pick(index) if index < entries.len() => {
                    Ok(entries.swap_remove(index).0)
                }
                Choice::Pick(_) | Choice::Skip => Err(ProviderError::NoTags("album")),
                Choice::Decline => Err(ProviderError::TooManyResults(entries.len())),
            };
        }

        entries
            .pop()
            .map(|(item, _)| item)
            .ok_or(ProviderError::NoTags("album"))
    }
}
