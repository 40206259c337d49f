//! Name resolution across marketplace sources (spec §4.J "Resolution of a
//! bare name N").

use semver::Version;

use super::manifest::ManifestEntry;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub source_name: String,
    pub entry: ManifestEntry,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    NotFound,
    Unique(Candidate),
    /// More than one source offers the name. `recommendation` is the
    /// highest-version candidate; ties break on the lexicographically
    /// earlier source name (spec §9 Open Questions, resolved in
    /// SPEC_FULL.md §11).
    Conflict {
        candidates: Vec<Candidate>,
        recommendation: Box<Candidate>,
    },
}

fn parse_version(raw: &str) -> Version {
    Version::parse(raw).unwrap_or(Version::new(0, 0, 0))
}

/// Resolves a bare photon name across every enabled source's cached
/// manifest. `sources` pairs a source name with its manifest entries.
pub fn resolve<'a>(name: &str, sources: impl Iterator<Item = (&'a str, &'a [ManifestEntry])>) -> Resolution {
    let mut candidates = Vec::new();
    for (source_name, entries) in sources {
        if let Some(entry) = entries.iter().find(|e| e.name == name) {
            candidates.push(Candidate {
                source_name: source_name.to_string(),
                entry: entry.clone(),
            });
        }
    }

    match candidates.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Unique(candidates.into_iter().next().unwrap()),
        _ => {
            let recommendation = candidates
                .iter()
                .cloned()
                .max_by(|a, b| {
                    let va = parse_version(&a.entry.version);
                    let vb = parse_version(&b.entry.version);
                    va.cmp(&vb).then_with(|| b.source_name.cmp(&a.source_name))
                })
                .expect("at least two candidates");
            Resolution::Conflict {
                candidates,
                recommendation: Box::new(recommendation),
            }
        }
    }
}

/// Resolves `marketplaceName:N`, forcing a single source. An error if that
/// source does not offer `N` (spec §4.J).
pub fn resolve_scoped<'a>(
    source_name: &str,
    name: &str,
    entries: &'a [ManifestEntry],
) -> Option<Candidate> {
    entries.iter().find(|e| e.name == name).map(|entry| Candidate {
        source_name: source_name.to_string(),
        entry: entry.clone(),
    })
}
