//! Shared size resolution for the layout algorithms (`spec.md` §4.6).
//!
//! Text/content measurement is out of scope (`spec.md` §1), so `Unit::Auto`
//! resolves contextually to either "fill available space" or a small fixed
//! default — there is no intrinsic-sizing pass here, unlike the teacher's
//! CSS-driven `size_resolver` which sized `auto` to content.

use crate::vnode::Unit;

/// Fixed height used for `Unit::Auto` when the caller's layout direction
/// does not fill by default (e.g. a row's non-stretched children).
pub const DEFAULT_FIXED_HEIGHT: i32 = 3;
/// Fixed width used for `Unit::Auto` when the caller's layout direction does
/// not fill by default (e.g. a column's non-stretched children).
pub const DEFAULT_FIXED_WIDTH: i32 = 10;

/// Resolves a width `Unit` against `available_width`. `fill_by_default`
/// selects what `Unit::Auto` (and the "no width specified" case, which does
/// not exist in this model since `Style::width` is never optional) means for
/// the caller's layout direction.
pub fn resolve_width(unit: Unit, available_width: i32, fill_by_default: bool) -> i32 {
    match unit {
        Unit::Cells(n) => n,
        Unit::Percent(pct) => ((pct as i64 * available_width as i64) / 100) as i32,
        Unit::Fraction(_) => available_width,
        Unit::Auto => {
            if fill_by_default {
                available_width
            } else {
                DEFAULT_FIXED_WIDTH
            }
        }
    }
}

/// Resolves a height `Unit` against `available_height`, mirroring
/// [`resolve_width`].
pub fn resolve_height(unit: Unit, available_height: i32, fill_by_default: bool) -> i32 {
    match unit {
        Unit::Cells(n) => n,
        Unit::Percent(pct) => ((pct as i64 * available_height as i64) / 100) as i32,
        Unit::Fraction(_) => available_height,
        Unit::Auto => {
            if fill_by_default {
                available_height
            } else {
                DEFAULT_FIXED_HEIGHT
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_toward_available() {
        assert_eq!(resolve_width(Unit::Percent(50), 81, true), 40);
    }

    #[test]
    fn auto_fills_or_falls_back_to_fixed_default() {
        assert_eq!(resolve_width(Unit::Auto, 40, true), 40);
        assert_eq!(resolve_width(Unit::Auto, 40, false), DEFAULT_FIXED_WIDTH);
    }

    #[test]
    fn cells_is_used_verbatim() {
        assert_eq!(resolve_height(Unit::Cells(7), 100, true), 7);
    }
}
