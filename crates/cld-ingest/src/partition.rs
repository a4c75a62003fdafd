// crates/cld-ingest/src/partition.rs
//
// Contiguous-block distribution of validated records across agents.
// Deterministic: same record sequence + same agent order => same output.
// NOT a round-robin interleave.

use cld_schemas::{Agent, AgentGroup, CallRecord};

/// Split `records` across `agents` in their given order: every agent gets
/// `floor(N / M)` records and the first `N mod M` agents take one extra.
/// Records are consumed contiguously from the front, so each group is a
/// consecutive slice of the upload and `original_index` stays intact.
///
/// More agents than records leaves trailing groups empty; that is valid
/// output, not an error. Callers gate the empty-agent case beforehand.
pub fn partition_records(records: Vec<CallRecord>, agents: &[Agent]) -> Vec<AgentGroup> {
    if agents.is_empty() {
        return Vec::new();
    }

    let total = records.len();
    let base = total / agents.len();
    let remainder = total % agents.len();

    let mut groups = Vec::with_capacity(agents.len());
    let mut rest = records;

    for (i, agent) in agents.iter().enumerate() {
        let take = base + usize::from(i < remainder);
        let tail = rest.split_off(take.min(rest.len()));
        groups.push(AgentGroup {
            agent: agent.clone(),
            records: rest,
        });
        rest = tail;
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn agents(n: usize) -> Vec<Agent> {
        (0..n)
            .map(|i| Agent {
                agent_id: Uuid::new_v4(),
                name: format!("Agent {i}"),
                email: format!("agent{i}@example.com"),
                mobile: format!("+1 555 010{i}"),
                is_active: true,
                created_at_utc: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, i as u32).unwrap(),
            })
            .collect()
    }

    fn records(n: usize) -> Vec<CallRecord> {
        (0..n)
            .map(|i| CallRecord {
                first_name: format!("Lead {i}"),
                phone: format!("555010{i}"),
                notes: String::new(),
                original_index: i as i64,
            })
            .collect()
    }

    #[test]
    fn seven_records_three_agents_split_3_2_2() {
        let groups = partition_records(records(7), &agents(3));
        let sizes: Vec<usize> = groups.iter().map(|g| g.records.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);

        // Contiguous blocks in upload order.
        assert_eq!(
            groups[0].records.iter().map(|r| r.original_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            groups[1].records.iter().map(|r| r.original_index).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert_eq!(
            groups[2].records.iter().map(|r| r.original_index).collect::<Vec<_>>(),
            vec![5, 6]
        );
    }

    #[test]
    fn sizes_and_coverage_hold_for_all_small_pools() {
        for m in 1..=5usize {
            for n in 0..=13usize {
                let groups = partition_records(records(n), &agents(m));
                assert_eq!(groups.len(), m);

                let base = n / m;
                let remainder = n % m;
                let mut seen = Vec::new();

                for (i, group) in groups.iter().enumerate() {
                    let expected = base + usize::from(i < remainder);
                    assert_eq!(group.records.len(), expected, "n={n} m={m} group={i}");
                    seen.extend(group.records.iter().map(|r| r.original_index));
                }

                // Concatenation in group order reproduces 0..n exactly:
                // no skips, no duplicates, no reordering.
                assert_eq!(seen, (0..n as i64).collect::<Vec<_>>(), "n={n} m={m}");
            }
        }
    }

    #[test]
    fn more_agents_than_records_leaves_trailing_groups_empty() {
        let groups = partition_records(records(2), &agents(5));
        let sizes: Vec<usize> = groups.iter().map(|g| g.records.len()).collect();
        assert_eq!(sizes, vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn identical_inputs_yield_identical_assignments() {
        let pool = agents(4);
        let first = partition_records(records(11), &pool);
        let second = partition_records(records(11), &pool);
        assert_eq!(first, second);
    }
}
