use std::io::{Cursor, Write};

use coverlap::{
    BundleReader, CoverlapError, Dimensions, KmzBundle, MaskNaming, MemoryBundle, Pipeline,
    PipelineConfig, PlacemarkRecord, RasterLayer, ResultEmitter, discover_bundles,
};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "coverlap_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn mask_png(w: u32, h: u32, alpha: &[u8]) -> Vec<u8> {
    let rgba = alpha.iter().flat_map(|&a| [0, 128, 0, a]).collect();
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn viewer_kml(lon: f64, lat: f64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <GroundOverlay><name>cloak</name></GroundOverlay>
    <Placemark>
      <name>Viewer</name>
      <description>position of viewer</description>
      <Point><coordinates>{lon},{lat},250</coordinates></Point>
    </Placemark>
  </Document>
</kml>"#
    )
}

fn kmz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zw = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zw.add_directory("files/", zip::write::FileOptions::default())
        .unwrap();
    for (name, bytes) in entries {
        zw.start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        zw.write_all(bytes).unwrap();
    }
    zw.finish().unwrap().into_inner()
}

#[test]
fn kmz_bundle_lists_masks_and_viewer() {
    let png = mask_png(1, 1, &[255]);
    let kml = viewer_kml(-94.25, 44.5);
    let bundle = KmzBundle::from_bytes(
        "a.kmz",
        kmz(&[
            ("doc.kml", kml.as_bytes()),
            ("files/cloakpN44W094.png", png.as_slice()),
            ("files/legend.png", png.as_slice()),
        ]),
    );

    let masks = bundle
        .list_mask_candidates(&MaskNaming::new("cloakp", "png"))
        .unwrap();
    assert_eq!(masks.len(), 1);
    assert_eq!(masks[0].name, "cloakpN44W094.png");
    assert_eq!(masks[0].bytes, png);

    let viewer = bundle.extract_viewer_placemark("position of viewer").unwrap();
    assert_eq!(viewer.name, "Viewer");
    assert_eq!(viewer.latitude, 44.5);
    assert_eq!(viewer.longitude, -94.25);
    assert_eq!(viewer.altitude, 250.0);
}

#[test]
fn malformed_kml_only_loses_the_placemark() {
    let png = mask_png(1, 1, &[255]);
    let bundle = KmzBundle::from_bytes(
        "broken.kmz",
        kmz(&[
            ("doc.kml", b"<kml><Document><Placemark>".as_slice()),
            ("cloakpX.png", png.as_slice()),
        ]),
    );
    assert!(matches!(
        bundle.viewer_placemark("position of viewer"),
        Err(CoverlapError::PlacemarkParse(_))
    ));
    assert_eq!(bundle.extract_viewer_placemark("position of viewer"), None);
    assert_eq!(
        bundle
            .list_mask_candidates(&MaskNaming::new("cloakp", "png"))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn not_a_zip_is_an_archive_error() {
    let bundle = KmzBundle::from_bytes("junk.kmz", b"not a zip".to_vec());
    let err = bundle
        .list_mask_candidates(&MaskNaming::new("cloakp", "png"))
        .unwrap_err();
    assert!(matches!(err, CoverlapError::Archive(_)));
}

#[test]
fn two_bundle_scenario_end_to_end() {
    let tmp = temp_dir("two_bundle");
    let input = tmp.join("kmz");
    let output = tmp.join("map_data");
    std::fs::create_dir_all(&input).unwrap();

    let a = kmz(&[
        ("doc.kml", viewer_kml(-94.0, 44.0).as_bytes()),
        ("files/cloakpTEST.png", mask_png(2, 2, &[255, 255, 255, 255]).as_slice()),
    ]);
    let b = kmz(&[
        ("doc.kml", viewer_kml(-93.0, 45.0).as_bytes()),
        ("files/cloakpTEST.png", mask_png(2, 2, &[255, 0, 0, 0]).as_slice()),
    ]);
    std::fs::write(input.join("a.kmz"), a).unwrap();
    std::fs::write(input.join("b.KMZ"), b).unwrap();
    std::fs::write(input.join("notes.txt"), b"ignored").unwrap();

    let paths = discover_bundles(&input).unwrap();
    assert_eq!(paths.len(), 2);
    let bundles: Vec<KmzBundle> = paths.iter().map(|p| KmzBundle::open(p).unwrap()).collect();

    let out = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&bundles);
    assert_eq!(out.keys(), vec!["TEST.png".to_string()]);
    let raster = &out.rasters[0].raster;
    assert_eq!(raster.dims, Dimensions::new(2, 2));
    assert_eq!(raster.pixel(0, 0), [255, 0, 0, 51]);
    assert_eq!(raster.pixel(1, 0), [255, 0, 0, 26]);
    assert_eq!(raster.pixel(0, 1), [255, 0, 0, 26]);
    assert_eq!(raster.pixel(1, 1), [255, 0, 0, 26]);
    assert_eq!(out.coordinates.len(), 2);

    let written = ResultEmitter::new(&output).emit(&out).unwrap();
    assert_eq!(written.len(), 3);

    let png = std::fs::read(output.join("TEST.png")).unwrap();
    let decoded = RasterLayer::decode(&png).unwrap();
    assert_eq!(decoded.rgba8, raster.rgba8);

    let manifest: Vec<String> =
        serde_json::from_slice(&std::fs::read(output.join("tiles.json")).unwrap()).unwrap();
    assert_eq!(manifest, vec!["TEST.png"]);

    let viewers: Vec<serde_json::Value> =
        serde_json::from_slice(&std::fs::read(output.join("viewers.json")).unwrap()).unwrap();
    assert_eq!(viewers.len(), 2);
    let lat = viewers[0]["latitude"].as_f64().unwrap();
    let lon = viewers[0]["longitude"].as_f64().unwrap();
    assert!((lat - 44.0).abs() <= 0.005 + 1e-12);
    assert!((lon + 94.0).abs() <= 0.005 + 1e-12);
    assert!(viewers[0].get("altitude").is_none());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn unreadable_bundle_is_skipped_by_pipeline() {
    let good = KmzBundle::from_bytes(
        "good.kmz",
        kmz(&[("cloakpX.png", mask_png(1, 1, &[255]).as_slice())]),
    );
    let bad = KmzBundle::from_bytes("bad.kmz", b"garbage".to_vec());

    let out = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&[bad, good]);
    assert_eq!(out.keys(), vec!["X.png".to_string()]);
    assert_eq!(out.skipped_bundles.len(), 1);
    assert_eq!(out.skipped_bundles[0].bundle, "bad.kmz");
    assert!(out.coordinates.is_empty());
}

#[test]
fn bad_output_key_still_emits_manifest_and_viewers() {
    let tmp = temp_dir("bad_key");
    let bundle = MemoryBundle {
        id: "a".to_string(),
        entries: vec![
            ("cloakpGOOD.png".to_string(), mask_png(1, 1, &[255])),
            ("cloakp\\EVIL.png".to_string(), mask_png(1, 1, &[255])),
        ],
        placemarks: vec![(
            "position of viewer".to_string(),
            PlacemarkRecord {
                name: "Viewer".to_string(),
                latitude: 44.0,
                longitude: -94.0,
                altitude: 0.0,
            },
        )],
    };

    let out = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&[bundle]);
    assert_eq!(out.failed_groups.len(), 1);
    assert!(matches!(
        out.failed_groups[0].error,
        CoverlapError::InvalidKey(_)
    ));

    ResultEmitter::new(&tmp).emit(&out).unwrap();
    assert!(tmp.join("GOOD.png").exists());
    let manifest: Vec<String> =
        serde_json::from_slice(&std::fs::read(tmp.join("tiles.json")).unwrap()).unwrap();
    assert_eq!(manifest, vec!["GOOD.png"]);
    let viewers: Vec<serde_json::Value> =
        serde_json::from_slice(&std::fs::read(tmp.join("viewers.json")).unwrap()).unwrap();
    assert_eq!(viewers.len(), 1);

    std::fs::remove_dir_all(&tmp).ok();
}
