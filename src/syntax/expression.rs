//! Boolean role expressions: `A and B`, `A or B`, `A not B`, `not A not B`.
//!
//! The grammar only supports one shape per expression. A positive part is a
//! single role, an `and` chain or an `or` chain, optionally followed by a `not`
//! chain; or the whole expression is a `not` chain over every member. When both
//! ` and ` and ` or ` appear, the expression is split on ` and ` and the `or`
//! text becomes part of a role name (which then fails to resolve).

use std::collections::HashSet;

use serenity::all::{RoleId, UserId};
use thiserror::Error;

use super::Directory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("no role named `{0}`")]
    UnknownRole(String),
    #[error("`not` is not followed by a role")]
    EmptyExclusion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Everyone,
    Single(String),
    AllOf(Vec<String>),
    AnyOf(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleExpression {
    selection: Selection,
    excluded: Vec<String>,
}

impl RoleExpression {
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        if !expression.contains("not ") {
            return Ok(RoleExpression {
                selection: Selection::parse(expression),
                excluded: Vec::new(),
            });
        }

        if expression.starts_with("not ") {
            // spaces are dropped entirely, so `not Server Boosters` names `ServerBoosters`
            let compact = expression.replace(' ', "");
            let excluded: Vec<String> = compact
                .split("not")
                .skip(1)
                .map(str::to_string)
                .collect();
            return Ok(RoleExpression {
                selection: Selection::Everyone,
                excluded,
            });
        }

        let mut parts = expression.split(" not ");
        let positive = parts.next().unwrap_or_default();
        let excluded: Vec<String> = parts.map(str::to_string).collect();
        if excluded.is_empty() {
            return Err(ExpressionError::EmptyExclusion);
        }

        Ok(RoleExpression {
            selection: Selection::parse(positive),
            excluded,
        })
    }

    /// Members matching the expression, in directory order.
    ///
    /// Excluded roles are resolved first; any unknown name, positive or
    /// excluded, fails the whole expression.
    pub fn evaluate<D: Directory + ?Sized>(
        &self,
        directory: &D,
    ) -> Result<Vec<UserId>, ExpressionError> {
        let excluded = resolve_roles(directory, &self.excluded)?;

        let mut members = match &self.selection {
            Selection::Everyone => directory.members(),
            Selection::Single(name) => directory.role_members(resolve_role(directory, name)?),
            Selection::AllOf(names) => intersect(directory, resolve_roles(directory, names)?),
            Selection::AnyOf(names) => union(directory, resolve_roles(directory, names)?),
        };

        for role in excluded {
            let holders: HashSet<UserId> = directory.role_members(role).into_iter().collect();
            members.retain(|member| !holders.contains(member));
        }

        Ok(members)
    }
}

impl Selection {
    fn parse(positive: &str) -> Self {
        let split = |separator: &str| -> Vec<String> {
            positive.split(separator).map(str::to_string).collect()
        };

        if positive.contains(" and ") {
            Selection::AllOf(split(" and "))
        } else if positive.contains(" or ") {
            Selection::AnyOf(split(" or "))
        } else {
            Selection::Single(positive.to_string())
        }
    }
}

/// Parses and evaluates `expression` against `directory` in one step.
pub fn evaluate<D: Directory + ?Sized>(
    expression: &str,
    directory: &D,
) -> Result<Vec<UserId>, ExpressionError> {
    RoleExpression::parse(expression)?.evaluate(directory)
}

fn resolve_role<D: Directory + ?Sized>(
    directory: &D,
    name: &str,
) -> Result<RoleId, ExpressionError> {
    directory
        .role_by_name(name)
        .ok_or_else(|| ExpressionError::UnknownRole(name.to_string()))
}

fn resolve_roles<D: Directory + ?Sized>(
    directory: &D,
    names: &[String],
) -> Result<Vec<RoleId>, ExpressionError> {
    names
        .iter()
        .map(|name| resolve_role(directory, name))
        .collect()
}

// An empty running set is reseeded by the next role instead of staying empty.
fn intersect<D: Directory + ?Sized>(directory: &D, roles: Vec<RoleId>) -> Vec<UserId> {
    let mut members: Vec<UserId> = Vec::new();
    for role in roles {
        let holders = directory.role_members(role);
        if members.is_empty() {
            members = holders;
        } else {
            let holders: HashSet<UserId> = holders.into_iter().collect();
            members.retain(|member| holders.contains(member));
        }
    }
    members
}

fn union<D: Directory + ?Sized>(directory: &D, roles: Vec<RoleId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for role in roles {
        for member in directory.role_members(role) {
            if seen.insert(member) {
                members.push(member);
            }
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GuildSnapshot;

    fn guild() -> GuildSnapshot {
        GuildSnapshot::default()
            .with_everyone(1)
            .with_role("test", 10)
            .with_role("2", 11)
            .with_role("1", 12)
            .with_role("Server Boosters", 13)
            .with_role("ServerBoosters", 14)
            .with_member("m1", "0001", 100, &[10, 12])
            .with_member("m2", "0002", 101, &[10, 11])
            .with_member("m3", "0003", 102, &[11, 13])
            .with_member("m4", "0004", 103, &[14])
    }

    fn ids(ids: &[u64]) -> Vec<UserId> {
        ids.iter().copied().map(UserId::new).collect()
    }

    #[test]
    fn conjunction_then_exclusion() {
        // arrange
        let guild = guild();

        // act
        let members = evaluate("test and 2 not 1", &guild);

        // assert
        assert_eq!(members, Ok(ids(&[101])));
    }

    #[test]
    fn disjunction_keeps_first_seen_order() {
        assert_eq!(evaluate("test or 2", &guild()), Ok(ids(&[100, 101, 102])));
    }

    #[test]
    fn single_role_with_exclusion() {
        assert_eq!(evaluate("test not 1", &guild()), Ok(ids(&[101])));
        assert_eq!(evaluate("2", &guild()), Ok(ids(&[101, 102])));
    }

    #[test]
    fn leading_not_starts_from_every_member() {
        assert_eq!(evaluate("not 1", &guild()), Ok(ids(&[101, 102, 103])));
        assert_eq!(evaluate("not 1 not 2", &guild()), Ok(ids(&[103])));
    }

    #[test]
    fn leading_not_chain_drops_spaces_from_role_names() {
        // `Server Boosters` is read as `ServerBoosters`
        assert_eq!(
            evaluate("not Server Boosters", &guild()),
            Ok(ids(&[100, 101, 102]))
        );
    }

    #[test]
    fn unknown_excluded_role_fails_whole_expression() {
        assert_eq!(
            evaluate("test and 2 not Ghost", &guild()),
            Err(ExpressionError::UnknownRole("Ghost".to_string()))
        );
        assert_eq!(
            evaluate("Ghost and Phantom not Ghost", &guild()),
            Err(ExpressionError::UnknownRole("Ghost".to_string()))
        );
    }

    #[test]
    fn unknown_positive_role_fails_whole_expression() {
        assert_eq!(
            evaluate("test or Ghost", &guild()),
            Err(ExpressionError::UnknownRole("Ghost".to_string()))
        );
    }

    #[test]
    fn role_names_are_case_sensitive() {
        assert_eq!(
            evaluate("TEST", &guild()),
            Err(ExpressionError::UnknownRole("TEST".to_string()))
        );
    }

    #[test]
    fn and_takes_priority_over_or() {
        assert_eq!(
            evaluate("test and 2 or 1", &guild()),
            Err(ExpressionError::UnknownRole("2 or 1".to_string()))
        );
        assert_eq!(
            evaluate("test or 2 and 1", &guild()),
            Err(ExpressionError::UnknownRole("test or 2".to_string()))
        );
    }

    #[test]
    fn empty_intersection_is_reseeded_by_next_role() {
        // {m1} and {m2, m3} is empty, so `test` seeds the result again
        assert_eq!(evaluate("1 and 2 and test", &guild()), Ok(ids(&[100, 101])));
    }

    #[test]
    fn empty_result_is_not_an_error() {
        assert_eq!(evaluate("1 not test", &guild()), Ok(Vec::new()));
    }

    #[test]
    fn not_without_separating_space_has_no_exclusions() {
        assert_eq!(
            RoleExpression::parse("Cannot Ghost"),
            Err(ExpressionError::EmptyExclusion)
        );
    }

    #[test]
    fn misplaced_not_takes_the_split_branch() {
        // only a literal `not ` prefix selects every member
        assert_eq!(
            evaluate(" not 1", &guild()),
            Err(ExpressionError::UnknownRole(String::new()))
        );
    }

    #[test]
    fn bare_not_resolves_an_empty_name() {
        assert_eq!(
            evaluate("not ", &guild()),
            Err(ExpressionError::UnknownRole(String::new()))
        );
    }
}
