use rusqlite::{Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::uml_model::{ClassRow, Package};

/// Every class paired with each of its attributes and connectors.
///
/// Generalizations are only listed under their start (subtype) class; all
/// other connectors are listed under both endpoints. Ordered by class, then
/// attribute, then connector.
const CLASS_ROWS_QUERY: &str = r#"
SELECT
    Class.Object_ID,
    Class.Name,
    Class.Package_ID,
    Class.Stereotype,
    Class.Note,
    Member.AttrID,
    Member.AttrName,
    Member.AttrCardinality,
    Member.AttrType,
    Member.AttrNote,
    Member.AttrStereotype,
    Member.RelID,
    Member.ConnectorType,
    Member.StartObjectID,
    Member.EndObjectID,
    Member.SourceCard,
    Member.DestCard,
    Member.SourceRole,
    Member.DestRole,
    Member.SourceRoleNote,
    Member.DestRoleNote,
    Member.RelNote
FROM t_object AS Class
LEFT JOIN (
    SELECT
        Attr.Object_ID AS OwnerID,
        Attr.ID AS AttrID,
        Attr.Name AS AttrName,
        Attr.LowerBound || '..' || Attr.UpperBound AS AttrCardinality,
        Attr.Type AS AttrType,
        Attr.Notes AS AttrNote,
        Attr.Stereotype AS AttrStereotype,
        NULL AS RelID,
        NULL AS ConnectorType,
        NULL AS StartObjectID,
        NULL AS EndObjectID,
        NULL AS SourceCard,
        NULL AS DestCard,
        NULL AS SourceRole,
        NULL AS DestRole,
        NULL AS SourceRoleNote,
        NULL AS DestRoleNote,
        NULL AS RelNote
    FROM t_attribute AS Attr

    UNION ALL

    SELECT
        Conn.Start_Object_ID, NULL, NULL, NULL, NULL, NULL, NULL,
        Conn.Connector_ID, Conn.Connector_Type, Conn.Start_Object_ID, Conn.End_Object_ID,
        Conn.SourceCard, Conn.DestCard, Conn.SourceRole, Conn.DestRole,
        Conn.SourceRoleNote, Conn.DestRoleNote, Conn.Notes
    FROM t_connector AS Conn

    UNION ALL

    SELECT
        Conn.End_Object_ID, NULL, NULL, NULL, NULL, NULL, NULL,
        Conn.Connector_ID, Conn.Connector_Type, Conn.Start_Object_ID, Conn.End_Object_ID,
        Conn.SourceCard, Conn.DestCard, Conn.SourceRole, Conn.DestRole,
        Conn.SourceRoleNote, Conn.DestRoleNote, Conn.Notes
    FROM t_connector AS Conn
    WHERE Conn.Connector_Type <> 'Generalization'
      AND Conn.End_Object_ID <> Conn.Start_Object_ID
) AS Member
ON Member.OwnerID = Class.Object_ID
WHERE Class.Object_Type = 'Class'
ORDER BY Class.Object_ID, Member.AttrID, Member.RelID
"#;

const PACKAGES_QUERY: &str = r#"
SELECT Package_ID, Name, Parent_ID, Notes
FROM t_package
ORDER BY Package_ID
"#;

/// Read-only access to an Enterprise Architect project (`.qea` is SQLite)
pub struct EaProjectReader {
    path: PathBuf,
    conn: Connection,
}

impl EaProjectReader {
    pub fn open(path: &Path) -> Result<Self, ReaderError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| ReaderError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), "Opened project file");

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            conn,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole row set is read before building starts.
    pub fn read_class_rows(&self) -> Result<Vec<ClassRow>, ReaderError> {
        let mut stmt = self.conn.prepare(CLASS_ROWS_QUERY)?;
        let rows = stmt
            .query_map([], class_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rows = rows.len(), "Read class rows");
        Ok(rows)
    }

    pub fn read_packages(&self) -> Result<Vec<Package>, ReaderError> {
        let mut stmt = self.conn.prepare(PACKAGES_QUERY)?;
        let packages = stmt
            .query_map([], |row| {
                Ok(Package {
                    id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    parent_id: row.get(2)?,
                    notes: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(packages = packages.len(), "Read packages");
        Ok(packages)
    }
}

fn class_row(row: &Row<'_>) -> rusqlite::Result<ClassRow> {
    Ok(ClassRow {
        class_id: row.get(0)?,
        class_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        class_package_id: row.get(2)?,
        class_stereotype: row.get(3)?,
        class_note: row.get(4)?,
        attr_id: row.get(5)?,
        attr_name: row.get(6)?,
        attr_cardinality: row.get(7)?,
        attr_type: row.get(8)?,
        attr_note: row.get(9)?,
        attr_stereotype: row.get(10)?,
        rel_id: row.get(11)?,
        connector_type: row.get(12)?,
        start_object_id: row.get(13)?,
        end_object_id: row.get(14)?,
        source_card: row.get(15)?,
        dest_card: row.get(16)?,
        source_role: row.get(17)?,
        dest_role: row.get(18)?,
        source_role_note: row.get(19)?,
        dest_role_note: row.get(20)?,
        rel_note: row.get(21)?,
    })
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Failed to open project file {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
        CREATE TABLE t_object (Object_ID INTEGER, Object_Type TEXT, Name TEXT, Package_ID INTEGER, Stereotype TEXT, Note TEXT);
        CREATE TABLE t_attribute (ID INTEGER, Object_ID INTEGER, Name TEXT, LowerBound TEXT, UpperBound TEXT, Type TEXT, Notes TEXT, Stereotype TEXT);
        CREATE TABLE t_connector (Connector_ID INTEGER, Connector_Type TEXT, Start_Object_ID INTEGER, End_Object_ID INTEGER,
            SourceCard TEXT, DestCard TEXT, SourceRole TEXT, DestRole TEXT, SourceRoleNote TEXT, DestRoleNote TEXT, Notes TEXT);
        CREATE TABLE t_package (Package_ID INTEGER, Name TEXT, Parent_ID INTEGER, Notes TEXT);

        INSERT INTO t_object VALUES (1, 'Class', 'IdentifiedObject', 3, NULL, 'Root class');
        INSERT INTO t_object VALUES (2, 'Class', 'Terminal', 3, NULL, NULL);
        INSERT INTO t_object VALUES (3, 'Class', 'Empty', 3, NULL, NULL);
        INSERT INTO t_object VALUES (4, 'Note', 'A note', 3, NULL, NULL);
        INSERT INTO t_attribute VALUES (10, 1, 'mRID', '0', '1', 'String', NULL, NULL);
        INSERT INTO t_attribute VALUES (11, 1, 'names', NULL, NULL, 'String', NULL, NULL);
        INSERT INTO t_connector VALUES (100, 'Generalization', 2, 1, NULL, NULL, NULL, NULL, NULL, NULL, NULL);
        INSERT INTO t_connector VALUES (101, 'Association', 2, 1, '0..*', '1', NULL, 'Owner', NULL, NULL, NULL);
        INSERT INTO t_package VALUES (1, 'Model', 0, NULL);
        INSERT INTO t_package VALUES (3, 'Core', 1, 'Core package');
    "#;

    fn reader() -> EaProjectReader {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        EaProjectReader::from_connection(conn)
    }

    #[test]
    fn test_read_class_rows() {
        let rows = reader().read_class_rows().unwrap();

        let ids: Vec<_> = rows.iter().map(|r| (r.class_id, r.attr_id, r.rel_id)).collect();
        assert_eq!(
            ids,
            vec![
                (1, None, Some(101)),
                (1, Some(10), None),
                (1, Some(11), None),
                (2, None, Some(100)),
                (2, None, Some(101)),
                (3, None, None),
            ]
        );

        // NULL attribute ids sort first, so connector rows lead their class
        assert_eq!(rows[0].connector_type.as_deref(), Some("Association"));
        assert_eq!(rows[0].dest_role.as_deref(), Some("Owner"));
        assert_eq!(rows[1].attr_cardinality.as_deref(), Some("0..1"));
        assert_eq!(rows[2].attr_cardinality, None);
        assert_eq!(rows[1].class_note.as_deref(), Some("Root class"));
        assert!(rows[5].is_empty_member());
    }

    #[test]
    fn test_read_packages() {
        let packages = reader().read_packages().unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[1].name, "Core");
        assert_eq!(packages[1].parent_id, Some(1));
        assert_eq!(packages[1].notes.as_deref(), Some("Core package"));
    }

    #[test]
    fn test_open_missing_file() {
        let result = EaProjectReader::open(Path::new("/nonexistent/project.qea"));
        assert!(matches!(result, Err(ReaderError::Open { .. })));
    }
}
