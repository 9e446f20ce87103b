use std::io::Cursor;

use proptest::prelude::*;

use dnsmasq_leases::{LeaseRecord, ParseMode, parse_reader};

fn field() -> impl Strategy<Value = String> {
    "[!-~]{1,20}"
}

fn lease_line() -> impl Strategy<Value = (i64, String, String, String, Option<String>)> {
    (
        0i64..4_000_000_000,
        "[0-9a-f]{2}(:[0-9a-f]{2}){5}",
        "[0-9]{1,3}(\\.[0-9]{1,3}){3}",
        field(),
        prop::option::of(field()),
    )
}

fn join(line: &(i64, String, String, String, Option<String>)) -> String {
    let (expiry, mac, ip, hostname, client_id) = line;
    match client_id {
        Some(client_id) => format!("{} {} {} {} {}", expiry, mac, ip, hostname, client_id),
        None => format!("{} {} {} {}", expiry, mac, ip, hostname),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn parse_never_panics_on_arbitrary_bytes(data: Vec<u8>) {
        let _ = parse_reader(Cursor::new(data), ParseMode::Lenient);
    }

    #[test]
    fn parse_line_never_panics_on_arbitrary_text(line in "\\PC*") {
        let _ = LeaseRecord::parse_line(&line, ParseMode::Strict);
        let _ = LeaseRecord::parse_line(&line, ParseMode::Lenient);
    }

    #[test]
    fn well_formed_lines_map_positionally(line in lease_line()) {
        let (expiry, mac, ip, hostname, client_id) = &line;
        let record = LeaseRecord::parse_line(&join(&line), ParseMode::Lenient).unwrap();

        prop_assert_eq!(record.expiry.timestamp(), *expiry);
        prop_assert_eq!(&record.mac_address, mac);
        prop_assert_eq!(&record.ip_address, ip);

        let expected_hostname = (hostname != "*").then(|| hostname.clone());
        prop_assert_eq!(record.hostname, expected_hostname);

        let expected_client_id = client_id.clone().filter(|id| id != "*");
        prop_assert_eq!(record.client_id, expected_client_id);
    }

    #[test]
    fn order_is_preserved_and_malformed_lines_are_skipped(
        lines in prop::collection::vec(lease_line(), 0..40),
        junk_every in 2usize..6,
    ) {
        let mut input = String::new();
        let mut junk = 0;
        for (index, line) in lines.iter().enumerate() {
            if index % junk_every == 0 {
                input.push_str("not-a-number a b c\n");
                junk += 1;
            }
            input.push_str(&join(line));
            input.push('\n');
        }

        let parsed = parse_reader(Cursor::new(input.clone()), ParseMode::Lenient).unwrap();
        prop_assert_eq!(parsed.records.len(), lines.len());
        prop_assert_eq!(parsed.skipped, junk);

        for (record, line) in parsed.records.iter().zip(lines.iter()) {
            prop_assert_eq!(&record.ip_address, &line.2);
            prop_assert_eq!(record.expiry.timestamp(), line.0);
        }

        let again = parse_reader(Cursor::new(input), ParseMode::Lenient).unwrap();
        prop_assert_eq!(again, parsed);
    }

    #[test]
    fn strict_mode_rejects_four_field_lines(line in lease_line()) {
        let four = (line.0, line.1.clone(), line.2.clone(), line.3.clone(), None);
        prop_assert!(LeaseRecord::parse_line(&join(&four), ParseMode::Strict).is_err());
    }
}
