mod support;

use csv::ReaderBuilder;
use freehub::{Options, avec::decode_slice};
use serde::Deserialize;
use support::*;

const PATH: &str = "fixtures/conversions.csv";

#[derive(Debug, Deserialize)]
struct Case {
    speed_unit: String,
    length_unit: String,
    temperature_unit: String,
    raw_speed: u16,
    raw_distance: u32,
    raw_temperature: i8,
    speed: f64,
    distance: f64,
    temperature: f64,
}

fn assert_close(field: &str, found: f64, expected: f64, case: &Case) {
    assert!(
        (found - expected).abs() < 1e-9,
        "{field}: found {found}, expected {expected} for {case:?}"
    );
}

#[test]
fn unit_conversions() {
    init_logging();

    let mut reader = ReaderBuilder::new().from_path(PATH).unwrap();
    let mut cases = 0;

    for case in reader.deserialize::<Case>() {
        let case = case.unwrap();

        let options: Options = serde_json::from_value(serde_json::json!({
            "speedUnit": case.speed_unit,
            "lengthUnit": case.length_unit,
            "temperatureUnit": case.temperature_unit,
        }))
        .unwrap();

        let data = FitBuilder::new()
            .definition(0, RECORD, &[(6, 2, UINT16), (5, 4, UINT32), (13, 1, SINT8)])
            .data(
                0,
                &body(&[
                    &case.raw_speed.to_le_bytes(),
                    &case.raw_distance.to_le_bytes(),
                    &case.raw_temperature.to_le_bytes(),
                ]),
            )
            .build();

        let decoded = decode_slice(&data, &options).unwrap();
        let record = &decoded.activity.records[0];

        assert_close("speed", record["speed"].as_f64().unwrap(), case.speed, &case);
        assert_close(
            "distance",
            record["distance"].as_f64().unwrap(),
            case.distance,
            &case,
        );
        assert_close(
            "temperature",
            record["temperature"].as_f64().unwrap(),
            case.temperature,
            &case,
        );

        cases += 1;
    }

    assert_eq!(cases, 5);
}

#[test]
fn kilometres_are_metres_over_one_thousand() {
    let options = Options {
        length_unit: freehub::options::LengthUnit::Kilometres,
        ..Options::default()
    };

    for raw in [1u32, 12345, 4_219_500] {
        let data = FitBuilder::new()
            .definition(0, RECORD, &[(5, 4, UINT32)])
            .data(0, &raw.to_le_bytes())
            .build();

        let metres = decode_slice(&data, &Options::default()).unwrap().activity.records[0]
            ["distance"]
            .as_f64()
            .unwrap();
        let kilometres = decode_slice(&data, &options).unwrap().activity.records[0]["distance"]
            .as_f64()
            .unwrap();

        assert_eq!(kilometres, metres / 1000.0);
    }
}
