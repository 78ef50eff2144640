//! Browser-side checks of the JS value shapes. Run with `wasm-pack test`.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

const CSV: &str = "PlotID,TreeID,Species,DBH,Year\n1,a,QR,10,2010\n1,a,QR,12,2015\n";

fn json(v: &wasm_bindgen::JsValue) -> String {
    js_sys::JSON::stringify(v).map(String::from).unwrap_or_default()
}

#[wasm_bindgen_test]
fn color_maps_are_plain_objects() {
    let v = sylva_wasm::normalize_csv(CSV, None).unwrap();
    let text = json(&v);
    assert!(text.contains(r#""assigned":{"QR":"green"}"#), "{text}");
    assert!(text.contains(r#""resolved":{"DBH":"DBH""#), "{text}");
}

#[wasm_bindgen_test]
fn no_data_is_null() {
    assert!(sylva_wasm::plot_year_stats(CSV, "9", None).unwrap().is_null());
    assert!(sylva_wasm::tree_increments(CSV, "9", None).unwrap().is_null());
}

#[wasm_bindgen_test]
fn undefined_mean_increment_is_null() {
    let single = "PlotID,TreeID,Species,DBH,Year\n1,a,QR,10,2010\n2,b,QR,11,2010\n";
    let v = sylva_wasm::compare(single, "1", "2", None, None).unwrap();
    assert!(json(&v).contains(r#""mean_increment":null"#));
}
