//! Building blocks for dynamically filtered queries.

use sqlx::{Postgres, QueryBuilder};

/// Joins optional filter predicates: the first one opens the WHERE clause,
/// every later one is AND-ed on.
#[derive(Debug, Default)]
pub struct Conditions {
    opened: bool,
}

impl Conditions {
    pub fn next(&mut self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(if self.opened { " AND " } else { " WHERE " });
        self.opened = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_predicate_opens_where() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM users u");
        let mut conditions = Conditions::default();
        conditions.next(&mut builder);
        builder.push("u.id IS NOT NULL");
        conditions.next(&mut builder);
        builder.push("u.role = 'user'");
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM users u WHERE u.id IS NOT NULL AND u.role = 'user'"
        );
    }
}
