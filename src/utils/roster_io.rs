use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One roster line in the bulk import/export exchange format.
///
/// The `student_id` column carries the human-readable student code, matching
/// the spreadsheet layout the roster was historically exchanged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RosterRow {
    #[serde(rename = "student_id")]
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub branch_id: u64,
}

pub fn read_roster(data: &[u8]) -> Result<Vec<RosterRow>> {
    let mut reader = csv::Reader::from_reader(data);
    let mut rows = Vec::new();
    for record in reader.deserialize::<RosterRow>() {
        rows.push(record?);
    }
    Ok(rows)
}

pub fn write_roster(rows: &[RosterRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush roster CSV: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<RosterRow> {
        vec![
            RosterRow {
                student_code: "2020-01".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                email: Some("ab@example.com".to_string()),
                branch_id: 1,
            },
            RosterRow {
                student_code: "2020-02".to_string(),
                first_name: "C".to_string(),
                last_name: "D".to_string(),
                email: None,
                branch_id: 2,
            },
        ]
    }

    #[test]
    fn export_then_import_reproduces_the_roster() {
        let rows = sample_rows();
        let csv = write_roster(&rows).unwrap();
        let parsed = read_roster(csv.as_bytes()).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn header_uses_the_exchange_column_names() {
        let csv = write_roster(&sample_rows()).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "student_id,first_name,last_name,email,branch_id");
    }

    #[test]
    fn missing_email_round_trips_as_none() {
        let csv = "student_id,first_name,last_name,email,branch_id\n2020-03,E,F,,4\n";
        let rows = read_roster(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, None);
        assert_eq!(rows[0].branch_id, 4);
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let csv = "student_id,first_name,last_name,email,branch_id\n2020-04,G,H,,not-a-number\n";
        assert!(read_roster(csv.as_bytes()).is_err());
    }
}
