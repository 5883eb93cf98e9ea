// LabelResolver - cluster index -> semantic label by majority vote
//
// Training rows are laid out in known contiguous groups (for example rows
// 0..10 are identity "A"). Each group votes for the cluster most of its rows
// were assigned to. The result is either an injective cluster -> label map
// or a report listing every way the vote was ambiguous:
//
// - Tie: two or more clusters share the top vote count within a group
// - NoStrictMajority: under StrictMajority the winner holds <= 50% of the group
// - Collision: two groups elect the same cluster
// - EmptyGroup: a group has no rows
//
// Clusters that no group elected have no label; callers map them to an
// "unrecognized" label.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::LabelError;

/// How many votes a group's winning cluster needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePolicy {
    /// More than half of the group's rows
    #[default]
    StrictMajority,
    /// Largest count wins (ties are still ambiguous)
    Plurality,
}

/// Contiguous block of training rows sharing one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelGroup {
    pub label: String,
    /// First row (inclusive)
    pub start: usize,
    /// One past the last row
    pub end: usize,
}

impl LabelGroup {
    pub fn new(label: impl Into<String>, rows: Range<usize>) -> Self {
        Self {
            label: label.into(),
            start: rows.start,
            end: rows.end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How one group voted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupVote {
    pub label: String,
    /// Winning cluster (lowest index among tied leaders)
    pub cluster: usize,
    pub votes: usize,
    pub group_size: usize,
    /// votes / group_size
    pub purity: f64,
}

/// One reason the vote could not produce a clean mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AmbiguityIssue {
    Tie {
        label: String,
        clusters: Vec<usize>,
        votes: usize,
    },
    NoStrictMajority {
        label: String,
        cluster: usize,
        votes: usize,
        group_size: usize,
    },
    Collision {
        cluster: usize,
        labels: Vec<String>,
    },
    EmptyGroup {
        label: String,
    },
}

impl fmt::Display for AmbiguityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmbiguityIssue::Tie {
                label,
                clusters,
                votes,
            } => write!(
                f,
                "group '{}' tied between clusters {:?} with {} votes each",
                label, clusters, votes
            ),
            AmbiguityIssue::NoStrictMajority {
                label,
                cluster,
                votes,
                group_size,
            } => write!(
                f,
                "group '{}' best cluster {} has only {}/{} votes",
                label, cluster, votes, group_size
            ),
            AmbiguityIssue::Collision { cluster, labels } => {
                write!(f, "cluster {} claimed by groups {:?}", cluster, labels)
            }
            AmbiguityIssue::EmptyGroup { label } => write!(f, "group '{}' has no rows", label),
        }
    }
}

/// Every ambiguity found in one resolution, plus the raw votes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelAmbiguityReport {
    pub issues: Vec<AmbiguityIssue>,
    pub votes: Vec<GroupVote>,
}

impl LabelAmbiguityReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for LabelAmbiguityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s)", self.issues.len())?;
        for (i, issue) in self.issues.iter().enumerate() {
            write!(f, "{} {}", if i == 0 { ":" } else { ";" }, issue)?;
        }
        Ok(())
    }
}

/// Resolved, injective cluster -> label table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMap {
    k: usize,
    labels: BTreeMap<usize, String>,
    votes: Vec<GroupVote>,
}

impl LabelMap {
    pub fn k(&self) -> usize {
        self.k
    }

    /// Label of `cluster`, or None when no group elected it
    pub fn label_for(&self, cluster: usize) -> Option<&str> {
        self.labels.get(&cluster).map(String::as_str)
    }

    /// Cluster elected by `label`
    pub fn cluster_for(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(&c, _)| c)
    }

    pub fn votes(&self) -> &[GroupVote] {
        &self.votes
    }

    /// Clusters in index order with their labels
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.labels.iter().map(|(&c, l)| (c, l.as_str()))
    }
}

/// Majority-vote resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelResolver {
    policy: VotePolicy,
}

impl LabelResolver {
    pub fn new(policy: VotePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> VotePolicy {
        self.policy
    }

    /// Resolve a label map from training assignments
    ///
    /// # Arguments
    /// * `assignments` - Cluster index per training row
    /// * `k` - Number of clusters the assignments come from
    /// * `groups` - Labelled row ranges into `assignments`
    ///
    /// # Errors
    /// - `ClusterOutOfRange` / `GroupOutOfRange` for inconsistent inputs
    /// - `OverlappingGroups` when a row belongs to more than one group
    /// - `Ambiguous` with a full report when any group tied, missed the
    ///   policy threshold, was empty, or collided with another group
    pub fn resolve(
        &self,
        assignments: &[usize],
        k: usize,
        groups: &[LabelGroup],
    ) -> Result<LabelMap, LabelError> {
        if let Some((row, &cluster)) = assignments.iter().enumerate().find(|(_, &c)| c >= k) {
            return Err(LabelError::ClusterOutOfRange { row, cluster, k });
        }
        if let Some(group) = groups.iter().find(|g| g.end > assignments.len()) {
            return Err(LabelError::GroupOutOfRange {
                label: group.label.clone(),
                end: group.end,
                rows: assignments.len(),
            });
        }
        check_disjoint(groups)?;

        let mut issues = Vec::new();
        let mut votes = Vec::new();

        for group in groups {
            if group.is_empty() {
                issues.push(AmbiguityIssue::EmptyGroup {
                    label: group.label.clone(),
                });
                continue;
            }

            let mut counts = vec![0usize; k];
            for &cluster in &assignments[group.start..group.end] {
                counts[cluster] += 1;
            }

            let top = counts.iter().copied().max().unwrap_or(0);
            let leaders: Vec<usize> = (0..k).filter(|&c| counts[c] == top).collect();
            let cluster = leaders[0];
            let size = group.len();

            if leaders.len() > 1 {
                issues.push(AmbiguityIssue::Tie {
                    label: group.label.clone(),
                    clusters: leaders.clone(),
                    votes: top,
                });
            } else if self.policy == VotePolicy::StrictMajority && top * 2 <= size {
                issues.push(AmbiguityIssue::NoStrictMajority {
                    label: group.label.clone(),
                    cluster,
                    votes: top,
                    group_size: size,
                });
            }

            votes.push(GroupVote {
                label: group.label.clone(),
                cluster,
                votes: top,
                group_size: size,
                purity: top as f64 / size as f64,
            });
        }

        let mut claims: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for vote in &votes {
            claims
                .entry(vote.cluster)
                .or_default()
                .push(vote.label.clone());
        }
        for (&cluster, labels) in &claims {
            if labels.len() > 1 {
                issues.push(AmbiguityIssue::Collision {
                    cluster,
                    labels: labels.clone(),
                });
            }
        }

        if !issues.is_empty() {
            let report = LabelAmbiguityReport { issues, votes };
            tracing::warn!(policy = ?self.policy, "Label resolution ambiguous: {}", report);
            return Err(LabelError::Ambiguous(report));
        }

        for vote in &votes {
            tracing::debug!(
                label = %vote.label,
                cluster = vote.cluster,
                purity = vote.purity,
                "Resolved label"
            );
        }

        let labels = votes
            .iter()
            .map(|v| (v.cluster, v.label.clone()))
            .collect();
        Ok(LabelMap { k, labels, votes })
    }
}

/// Group ranges may come in any order but must not share a row
fn check_disjoint(groups: &[LabelGroup]) -> Result<(), LabelError> {
    let mut ranges: Vec<&LabelGroup> = groups.iter().filter(|g| !g.is_empty()).collect();
    ranges.sort_by_key(|g| g.start);
    for pair in ranges.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(LabelError::OverlappingGroups {
                first: pair[0].label.clone(),
                second: pair[1].label.clone(),
            });
        }
    }
    Ok(())
}
