//! Plain-text plan tables
//!
//! Rendered by the daemon on dry runs and single-pass runs.

use crate::model::{AutoScalingGroup, Evaluation};
use std::collections::BTreeMap;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Placeholder for an absent address
const NONE: &str = "-";

/// Table row for one group member
#[derive(Debug, Tabled)]
struct GroupRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "INSTANCE")]
    instance: String,
    #[tabled(rename = "PRIVATE")]
    private: String,
    #[tabled(rename = "PUBLIC")]
    public: String,
}

/// Table row for one evaluation
#[derive(Debug, Tabled)]
struct EvalRow {
    #[tabled(rename = "TYPE")]
    kind: String,
    #[tabled(rename = "RECORD")]
    record: String,
    #[tabled(rename = "VALUES")]
    values: String,
}

impl From<&Evaluation> for EvalRow {
    fn from(eval: &Evaluation) -> Self {
        Self {
            kind: eval.kind.label().to_string(),
            record: eval.record.fqdn(),
            values: eval.record.ips.join(","),
        }
    }
}

/// Groups and their members, one row per instance
///
/// ```text
/// AUTOSCALING GROUPS
///  NAME   INSTANCE   PRIVATE    PUBLIC
///  asg1   i-1        10.0.0.1   -
/// ```
pub fn groups_table(groups: &BTreeMap<String, AutoScalingGroup>) -> String {
    let rows: Vec<GroupRow> = groups
        .values()
        .flat_map(|group| {
            group.instances.iter().map(move |instance| GroupRow {
                name: group.name.clone(),
                instance: instance.id.clone(),
                private: instance.private_ip.clone().unwrap_or_else(|| NONE.to_string()),
                public: instance.public_ip.clone().unwrap_or_else(|| NONE.to_string()),
            })
        })
        .collect();
    titled("AUTOSCALING GROUPS", Table::new(rows))
}

/// Evaluations, one row each
///
/// ```text
/// EVALS
///  TYPE     RECORD             VALUES
///  delete   www.example.com.   10.0.0.1
///  create   www.example.com.   10.0.0.1,10.0.0.2
/// ```
pub fn evaluations_table(evals: &[Evaluation]) -> String {
    let rows: Vec<EvalRow> = evals.iter().map(EvalRow::from).collect();
    titled("EVALS", Table::new(rows))
}

fn titled(title: &str, mut table: Table) -> String {
    table.with(Style::blank());
    format!("{}\n{}\n", title, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Instance, Record, Zone};

    fn cells(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn test_groups_table() {
        let mut groups = BTreeMap::new();
        groups.insert(
            "asg1".to_string(),
            AutoScalingGroup::new(
                "asg1",
                vec![
                    Instance::new("i-1").with_private_ip("10.0.0.1"),
                    Instance::new("i-22")
                        .with_private_ip("10.0.0.2")
                        .with_public_ip("1.1.1.1"),
                ],
            ),
        );

        let table = groups_table(&groups);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "AUTOSCALING GROUPS");
        assert_eq!(cells(lines[1]), vec!["NAME", "INSTANCE", "PRIVATE", "PUBLIC"]);
        assert_eq!(cells(lines[2]), vec!["asg1", "i-1", "10.0.0.1", "-"]);
        assert_eq!(cells(lines[3]), vec!["asg1", "i-22", "10.0.0.2", "1.1.1.1"]);

        // Columns are aligned
        assert_eq!(lines[2].find("10.0.0.1"), lines[3].find("10.0.0.2"));
    }

    #[test]
    fn test_evaluations_table() {
        let zone = Zone::new("Z1", "example.com");
        let evals = vec![
            Evaluation::remove(Record::new(zone.clone(), "www", vec!["10.0.0.1".to_string()])),
            Evaluation::add(Record::new(
                zone,
                "www",
                vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            )),
        ];

        let table = evaluations_table(&evals);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "EVALS");
        assert_eq!(cells(lines[1]), vec!["TYPE", "RECORD", "VALUES"]);
        assert_eq!(cells(lines[2]), vec!["delete", "www.example.com.", "10.0.0.1"]);
        assert_eq!(
            cells(lines[3]),
            vec!["create", "www.example.com.", "10.0.0.1,10.0.0.2"]
        );
    }

    #[test]
    fn test_empty_tables_have_headers() {
        let table = evaluations_table(&[]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "EVALS");
        assert_eq!(cells(lines[1]), vec!["TYPE", "RECORD", "VALUES"]);
        assert_eq!(lines.len(), 2);
    }
}
