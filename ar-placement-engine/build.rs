// build.rs
use std::{env, fs, path::PathBuf};

// Seed catalog written when the asset folder has none, so a fresh checkout
// starts with something to place. An existing catalog is never touched.
const DEFAULT_CATALOG: &[(&str, &[&str], [f32; 3])] = &[
    ("table", &["coffee-table", "dining-table"], [1.2, 0.75, 0.8]),
    ("chair", &["armchair", "dining-chair"], [0.6, 0.9, 0.6]),
    ("sofa", &["two-seater", "corner-sofa"], [2.0, 0.85, 0.9]),
    ("vase", &["tall-vase", "bowl-vase"], [0.25, 0.5, 0.25]),
    ("rug", &["round-rug", "runner-rug"], [2.0, 0.02, 1.4]),
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=assets/catalog.json");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let assets_dir = PathBuf::from(manifest_dir).join("assets");
    let catalog_path = assets_dir.join("catalog.json");
    if catalog_path.exists() {
        return;
    }

    let items: Vec<serde_json::Value> = DEFAULT_CATALOG
        .iter()
        .flat_map(|(category, items, bounds)| {
            items.iter().map(move |item| {
                serde_json::json!({
                    "id": item,
                    "category": category,
                    "model": format!("models/{category}/{item}/scene.gltf"),
                    "bounds": bounds,
                })
            })
        })
        .collect();
    let catalog = serde_json::json!({ "items": items });

    let Ok(json_content) = serde_json::to_string_pretty(&catalog) else {
        return;
    };
    fs::create_dir_all(&assets_dir).ok(); // Create assets dir if it doesn't exist
    if fs::write(&catalog_path, json_content).is_ok() {
        println!("cargo:warning=Generated default catalog in assets/catalog.json");
    }
}
