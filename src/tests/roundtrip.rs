use crate::{
    document::{CEP, LAT, LATITUDE, LON, LONGITUDE, TIME},
    prelude::{
        AggregationMode, Epoch, Estimator, MetadataContext, OutputDocument, PositionSample,
        Registry, Resolver, StationCode,
    },
    tests::toolkit::{hourly_samples, spice38_fixes},
};

fn document(
    station: StationCode,
    mode: AggregationMode,
    fixes: Vec<PositionSample>,
) -> OutputDocument {
    let created = Epoch::from_gregorian_utc_hms(2023, 9, 2, 8, 0, 0);

    let (aggregate, representative) = Estimator::new(Registry::builtin().unwrap(), created)
        .with_mode(mode)
        .representative(station, &fixes)
        .unwrap();

    let ctx = MetadataContext::new(station, aggregate, representative, &fixes, created).unwrap();

    let attributes = Resolver::default().resolve(&ctx).unwrap();
    OutputDocument::new(fixes, &representative, attributes).unwrap()
}

#[test]
fn write_then_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.nc");

    let doc = document(
        StationCode::Spice38,
        AggregationMode::StableReference,
        spice38_fixes(),
    );
    doc.write(&path).unwrap();

    let parsed = OutputDocument::from_file(&path).unwrap();

    assert_eq!(parsed.sample_count(), doc.sample_count());
    assert_eq!(parsed.coordinate(), doc.coordinate());

    for (written, read) in doc.samples().iter().zip(parsed.samples().iter()) {
        let dt = (written.epoch - read.epoch).abs();
        assert!(dt.to_seconds() < 1.0e-3, "epoch drift {}", dt);
        assert!((written.latitude - read.latitude).abs() < 1.0e-9);
        assert!((written.longitude - read.longitude).abs() < 1.0e-9);
        assert!((written.cep - read.cep).abs() < 1.0e-9);
    }

    let attributes = parsed.attributes();
    assert_eq!(attributes, doc.attributes());

    for (key, value) in attributes.global.iter() {
        assert!(!value.is_placeholder(), "global \"{}\" = \"{}\"", key, value);
        assert_ne!(value.as_text(), Some("filler"));
    }

    for name in [TIME, LATITUDE, LONGITUDE, CEP, LAT, LON] {
        let vars = attributes.variable(name).unwrap();
        assert!(!vars.is_empty());
        for (key, value) in vars.iter() {
            assert!(!value.is_placeholder(), "{}:{} = \"{}\"", name, key, value);
        }
    }
}

#[test]
fn antimeridian_station() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("antimeridian.nc");

    let doc = document(
        StationCode::Spice36,
        AggregationMode::PerRunAverage,
        hourly_samples(&[(-16.5, 179.9, 2.0), (-16.5, -179.9, 2.0)]),
    );

    let (_, lon) = doc.coordinate();
    assert!(lon.abs() > 179.9, "longitude {}", lon);

    doc.write(&path).unwrap();

    let parsed = OutputDocument::from_file(&path).unwrap();
    let (_, lon) = parsed.coordinate();
    assert!(lon.abs() > 179.9, "longitude {}", lon);
    assert!(parsed.samples()[1].longitude < 0.0);
}
