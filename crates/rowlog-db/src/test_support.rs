//! Shared test utilities for rowlog-db unit tests.

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fmt;

    use rowlog_core::errors::RelationError;
    use rowlog_core::{Audited, Decimal, FieldValue, LogTable, Related};

    use crate::error::DatabaseError;
    use crate::persist::Persisted;

    pub const FIXTURE_DDL: &str = "
        CREATE TABLE IF NOT EXISTS mymodel (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);
        CREATE TABLE IF NOT EXISTS manualnote (id INTEGER PRIMARY KEY, body TEXT NOT NULL);
        CREATE TABLE IF NOT EXISTS child (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            height TEXT,
            mood TEXT NOT NULL
        );
    ";

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MyModel {
        pub id: Option<i64>,
        pub name: String,
    }

    impl MyModel {
        pub fn new(name: &str) -> Self {
            Self {
                id: None,
                name: name.to_string(),
            }
        }

        pub fn saved(id: i64, name: &str) -> Self {
            Self {
                id: Some(id),
                name: name.to_string(),
            }
        }
    }

    impl fmt::Display for MyModel {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "MyModel {}", self.name)
        }
    }

    impl Audited for MyModel {
        const ENTITY_TYPE: &'static str = "mymodel";
        const COLUMNS: &'static [&'static str] = &["id", "name"];

        fn log_table() -> LogTable {
            LogTable::default()
        }

        fn column_values(&self) -> Vec<FieldValue> {
            vec![self.id.into(), self.name.as_str().into()]
        }
    }

    impl Persisted for MyModel {
        fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError> {
            Ok(Self {
                id: Some(row.get::<i64>(0)?),
                name: row.get::<String>(1)?,
            })
        }

        fn assign_rowid(&mut self, rowid: i64) {
            self.id = Some(rowid);
        }
    }

    /// Audited by hand: the interceptor never logs it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ManualNote {
        pub id: i64,
        pub body: String,
    }

    impl ManualNote {
        pub fn saved(id: i64, body: &str) -> Self {
            Self {
                id,
                body: body.to_string(),
            }
        }
    }

    impl fmt::Display for ManualNote {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.body)
        }
    }

    impl Audited for ManualNote {
        const ENTITY_TYPE: &'static str = "manualnote";
        const COLUMNS: &'static [&'static str] = &["id", "body"];

        fn log_table() -> LogTable {
            LogTable::default()
        }

        fn manage_audit_manually() -> bool {
            true
        }

        fn column_values(&self) -> Vec<FieldValue> {
            vec![self.id.into(), self.body.as_str().into()]
        }
    }

    impl Persisted for ManualNote {
        fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError> {
            Ok(Self {
                id: row.get::<i64>(0)?,
                body: row.get::<String>(1)?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Parent {
        pub name: String,
    }

    impl fmt::Display for Parent {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.name)
        }
    }

    /// Entity with a decimal, an enum, a to-one and a to-many relationship.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Child {
        pub id: Option<i64>,
        pub name: String,
        pub height: Option<Decimal>,
        pub mood: &'static str,
        pub parent: Option<Parent>,
        pub parent_unavailable: bool,
    }

    impl Child {
        pub fn new(name: &str) -> Self {
            Self {
                id: None,
                name: name.to_string(),
                height: None,
                mood: "CALM",
                parent: None,
                parent_unavailable: false,
            }
        }
    }

    impl fmt::Display for Child {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.name)
        }
    }

    impl Audited for Child {
        const ENTITY_TYPE: &'static str = "child";
        const COLUMNS: &'static [&'static str] = &["id", "name", "height", "mood"];
        const RELATIONSHIPS: &'static [&'static str] = &["parent", "toys"];

        fn log_table() -> LogTable {
            LogTable::default()
        }

        fn column_values(&self) -> Vec<FieldValue> {
            vec![
                self.id.into(),
                self.name.as_str().into(),
                self.height.into(),
                FieldValue::variant(self.mood),
            ]
        }

        fn related(&self, name: &str) -> Result<Related, RelationError> {
            match name {
                "parent" if self.parent_unavailable => {
                    Err(RelationError::new(name, "parent row is gone"))
                }
                "parent" => Ok(Related::from_option(self.parent.as_ref())),
                "toys" => Ok(Related::Many),
                _ => Ok(Related::Null),
            }
        }
    }

    impl Persisted for Child {
        fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError> {
            let height = row
                .get::<Option<String>>(2)?
                .map(|h| h.parse::<Decimal>())
                .transpose()?;
            let mood = match row.get::<String>(3)?.as_str() {
                "HAPPY" => "HAPPY",
                _ => "CALM",
            };
            Ok(Self {
                id: Some(row.get::<i64>(0)?),
                name: row.get::<String>(1)?,
                height,
                mood,
                parent: None,
                parent_unavailable: false,
            })
        }

        fn assign_rowid(&mut self, rowid: i64) {
            self.id = Some(rowid);
        }
    }
}

#[cfg(test)]
pub(crate) mod helpers {
    use crate::AuditDb;
    use crate::service::AuditService;

    use super::fixtures::{Child, FIXTURE_DDL, ManualNote, MyModel};

    /// In-memory service with the fixture tables created and every fixture
    /// type registered.
    pub async fn test_service() -> AuditService {
        let db = AuditDb::open_local(":memory:").await.unwrap();
        db.conn().execute_batch(FIXTURE_DDL).await.unwrap();
        let mut svc = AuditService::from_db(db);
        svc.register::<MyModel>().await.unwrap();
        svc.register::<ManualNote>().await.unwrap();
        svc.register::<Child>().await.unwrap();
        svc
    }
}
