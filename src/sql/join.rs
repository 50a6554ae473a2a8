//! FROM-clause rendering for a resolved [`JoinPlan`].

use super::quote::quote_ident;
use crate::planner::{Join, JoinPlan};

/// Render the tables of a plan as a chain of inner joins.
///
/// Nested joins become a parenthesized sub-join aliased to the link table:
/// `T1 INNER JOIN (T2 INNER JOIN T3 ON T2.k2 = T3.k2) T2 ON T1.k1 = T2.k1`.
pub fn inner_join(plan: &JoinPlan) -> String {
    let primary = quote_ident(plan.primary());
    let mut sql = primary.clone();

    for join in plan.joins() {
        match join {
            Join::Direct { table, key } => {
                sql.push_str(&format!(
                    " INNER JOIN {table} ON {primary}.{key} = {table}.{key}",
                    table = quote_ident(table),
                    key = quote_ident(key),
                ));
            }
            Join::Nested { link, key, tables } => {
                let link = quote_ident(link);
                let mut sub = link.clone();
                for (table, sub_key) in tables {
                    sub.push_str(&format!(
                        " INNER JOIN {table} ON {link}.{key} = {table}.{key}",
                        table = quote_ident(table),
                        key = quote_ident(sub_key),
                    ));
                }
                sql.push_str(&format!(
                    " INNER JOIN ({sub}) {link} ON {primary}.{key} = {link}.{key}",
                    key = quote_ident(key),
                ));
            }
        }
    }

    sql
}
