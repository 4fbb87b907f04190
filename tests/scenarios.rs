use std::fs;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use salesmr::input::read_all_from_directory;
use salesmr::output::{write_results, PerformanceReport};
use salesmr::standalone::perf::{run_sweep, Sweep};
use salesmr::standalone::pool::DEFAULT_PHASE_TIMEOUT;
use salesmr::*;
use tempfile::tempdir;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn write_csv(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn summary(ranked: &[(String, CategoryStats)]) -> Vec<(String, Decimal, i64)> {
    ranked
        .iter()
        .map(|(c, s)| (c.clone(), s.total_revenue(), s.total_quantity()))
        .collect()
}

const SCENARIO_A: &str = "transaction_id,product_id,category,price,quantity
1,10,Books,12.50,2
2,11,Books,7.00,1
3,20,Toys,5.25,4
";

#[test]
fn scenario_a_single_file_two_categories() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "sales.csv", SCENARIO_A);

    let ingested = read_all_from_directory(dir.path()).unwrap();
    assert_eq!(ingested.records.len(), 3);
    assert_eq!(ingested.rejected, 0);

    let ranked = analyze(&ingested.records, 4, 4).unwrap();
    assert_eq!(
        summary(&ranked),
        vec![
            ("Books".to_string(), dec("32.00"), 3),
            ("Toys".to_string(), dec("21.00"), 4),
        ]
    );

    let mut buf = Vec::new();
    write_results(&mut buf, &ranked).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let rows: Vec<Vec<&str>> = text.lines().map(|l| l.split_whitespace().collect()).collect();
    assert_eq!(rows[0], vec!["Category", "Revenue", "Quantity"]);
    assert_eq!(rows[1], vec!["Books", "32.00", "3"]);
    assert_eq!(rows[2], vec!["Toys", "21.00", "4"]);
}

#[test]
fn scenario_b_invalid_lines_are_dropped() {
    let dir = tempdir().unwrap();
    write_csv(
        dir.path(),
        "mixed.csv",
        "1,10,Books,12.50,2\n2,11,,7.00,1\n3,20,Toys,abc,4\n4,21,Toys,1.00,5\n",
    );

    let ingested = read_all_from_directory(dir.path()).unwrap();
    assert_eq!(ingested.rejected, 2);

    let ranked = analyze(&ingested.records, 2, 2).unwrap();
    assert_eq!(
        summary(&ranked),
        vec![
            ("Books".to_string(), dec("25.00"), 2),
            ("Toys".to_string(), dec("5.00"), 5),
        ]
    );
}

#[test]
fn scenario_c_empty_directory() {
    let dir = tempdir().unwrap();
    let ingested = read_all_from_directory(dir.path()).unwrap();
    assert!(ingested.records.is_empty());
    assert_eq!(ingested.rejected, 0);
    assert!(analyze(&ingested.records, 4, 4).unwrap().is_empty());
}

#[test]
fn scenario_d_parallelism_sweep() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "sales.csv", SCENARIO_A);
    let records = read_all_from_directory(dir.path()).unwrap().records;

    let profiles = [1, 2, 4];
    let baseline = analyze(&records, 1, 1).unwrap();
    for m in profiles {
        for r in profiles {
            assert_eq!(analyze(&records, m, r).unwrap(), baseline, "profile ({m}, {r})");
        }
    }

    let sweep = Sweep {
        map_profiles: profiles.to_vec(),
        reduce_profiles: profiles.to_vec(),
        phase_timeout: DEFAULT_PHASE_TIMEOUT,
    };
    let mut report = PerformanceReport::new(Vec::new()).unwrap();
    run_sweep(&records, &sweep, &mut report, &CancellationFlag::new()).unwrap();
    let text = String::from_utf8(report.finish().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "mapThreads,reduceThreads,durationMillis");
    let mut expected = Vec::new();
    for m in profiles {
        for r in profiles {
            expected.push((m, r));
        }
    }
    for (line, (m, r)) in lines[1..].iter().zip(expected) {
        let cols: Vec<&str> = line.split(',').collect();
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0], m.to_string());
        assert_eq!(cols[1], r.to_string());
        assert!(cols[2].parse::<u128>().is_ok());
    }
}

#[test]
fn scenario_e_decimal_precision() {
    let dir = tempdir().unwrap();
    let body: String = (1..=10).map(|i| format!("{i},1,Pens,0.10,3\n")).collect();
    write_csv(dir.path(), "pens.csv", &body);

    let records = read_all_from_directory(dir.path()).unwrap().records;
    let ranked = analyze(&records, 3, 2).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].1.total_revenue(), dec("3.00"));
    assert_eq!(ranked[0].1.total_quantity(), 30);
}

#[test]
fn scenario_f_skewed_categories() {
    let mut records = Vec::new();
    for i in 0..10_000 {
        records.push(SalesRecord::new(i, 1, "Bulk", dec("1.01"), 2).unwrap());
    }
    for c in 0..9 {
        records.push(SalesRecord::new(20_000 + c, 2, format!("Rare{c}"), dec("5"), 1).unwrap());
    }

    let ranked = analyze(&records, 4, 4).unwrap();
    assert_eq!(ranked.len(), 10);
    assert_eq!(ranked[0].0, "Bulk");
    assert_eq!(ranked[0].1.total_quantity(), 20_000);
    assert_eq!(ranked[0].1.total_revenue(), dec("20200.00"));
    for (category, stats) in &ranked[1..] {
        assert!(category.starts_with("Rare"));
        assert_eq!(stats.total_quantity(), 1);
    }
}

#[test]
fn headers_and_blank_lines_in_several_files() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "a.csv", "transaction_id,product_id,category,price,quantity\n\n1,1,Books,1.00,1\n   \n");
    write_csv(dir.path(), "b.CSV", "TRANSACTION_ID,x\n2,1,Books,2.00,2\n");
    write_csv(dir.path(), "notes.txt", "3,1,Books,100.00,100\n");
    fs::create_dir(dir.path().join("nested.csv")).unwrap();

    let ingested = read_all_from_directory(dir.path()).unwrap();
    assert_eq!(ingested.rejected, 0);
    let ranked = analyze(&ingested.records, 2, 2).unwrap();
    assert_eq!(summary(&ranked), vec![("Books".to_string(), dec("5.00"), 3)]);
}

#[test]
fn numbered_files_are_read_in_order() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "0.csv", "1,1,Books,1.00,1\n");
    write_csv(dir.path(), "1.csv", "2,1,Toys,1.00,1\n");
    write_csv(dir.path(), "2.csv", "3,1,Games,1.00,1\n");

    let ingested = salesmr::input::read_numbered_files(dir.path(), 2).unwrap();
    let ids: Vec<i64> = ingested.records.iter().map(SalesRecord::transaction_id).collect();
    assert_eq!(ids, vec![1, 2]);

    let err = salesmr::input::read_numbered_files(dir.path(), 4).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
