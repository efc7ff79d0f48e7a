use crate::types::{Statement, EFFECT_ALLOW, EFFECT_DENY};
use crate::urn;

/// Outcome of evaluating a statement set against one (action, resource)
/// pair. `Deny` and `NoMatch` are both "not authorized" at the API
/// boundary; the distinction only matters to list filtering and error
/// shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    NoMatch,
}

/// Evaluate `statements` for `action` on the concrete `resource` URN.
///
/// A statement applies iff at least one of its action patterns matches the
/// action AND at least one of its resource patterns matches the resource.
/// Any applicable deny wins; otherwise any applicable allow wins; otherwise
/// nothing matched. Statement order is irrelevant.
pub fn evaluate(statements: &[Statement], action: &str, resource: &str) -> Decision {
    let mut allowed = false;
    for statement in statements {
        let applies = statement.actions.iter().any(|p| urn::matches(p, action))
            && statement.resources.iter().any(|p| urn::matches(p, resource));
        if !applies {
            continue;
        }
        if statement.effect == EFFECT_DENY {
            return Decision::Deny;
        }
        if statement.effect == EFFECT_ALLOW {
            allowed = true;
        }
    }
    if allowed {
        Decision::Allow
    } else {
        Decision::NoMatch
    }
}
