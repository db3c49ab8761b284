//! End-to-end pipeline test over a synthetic compiled asset tree.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

use cocorestore_cli::restore::{run, RestoreOptions};
use cocorestore_media::Fetch;

struct StubFetcher {
    body: Option<Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubFetcher {
    fn serving(body: &[u8]) -> Self {
        Self {
            body: Some(body.to_vec()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Fetch for StubFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self.requests.borrow_mut().push(url.to_owned());
        self.body.clone()
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    let mut encoder = png::Encoder::new(&mut data, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer
        .write_image_data(&vec![0u8; (width * height * 4) as usize])
        .unwrap();
    drop(writer);
    data
}

fn write(root: &Path, rel: &str, body: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    path
}

fn write_doc(root: &Path, rel: &str, doc: &Value) {
    write(root, rel, serde_json::to_string(doc).unwrap().as_bytes());
}

fn frame(name: &str, x: i64) -> Value {
    json!({
        "name": name,
        "rect": [x, 0, 4, 4],
        "offset": [0, 0],
        "originalSize": [4, 4]
    })
}

/// Build a complete synthetic asset root: one genuine atlas texture, one
/// stub texture, a skeleton bundle, an explicit clip, and an audio payload.
fn build_fixture(assets: &Path) {
    write(assets, "native/ab/sheet.png", &png_bytes(8, 8));
    write(
        assets,
        "native/ef/tex.png",
        b"No Content https://cdn.example.com/fx.png",
    );
    write(assets, "native/res/bgm.mp3", b"ID3 not really audio");

    write_doc(
        assets,
        "import/a_atlas.json",
        &json!([
            "cc.SpriteFrame",
            ["abcd1234"],
            {
                "frames": [
                    frame("glow_01", 0),
                    frame("glow_02", 4),
                    frame("glow_03", 8),
                    frame("glow_05", 12),
                    frame("logo", 16)
                ]
            }
        ]),
    );
    // Same reference from a second document, with a conflicting rect for an
    // already-seen frame name: first-seen wins.
    write_doc(
        assets,
        "import/b_atlas.json",
        &json!(["cc.SpriteFrame", ["abcd1234"], {"frames": [frame("glow_01", 99)]}]),
    );
    write_doc(
        assets,
        "import/c_stub_atlas.json",
        &json!([
            "cc.SpriteFrame",
            ["efab9999"],
            {"frames": [frame("fx_1", 0), frame("fx_2", 4), frame("fx_3", 8)]}
        ]),
    );
    write_doc(
        assets,
        "import/anim_run.json",
        &json!([
            "cc.AnimationClip",
            ["abcd1234"],
            [0, "run", 1.5, 24, ["spriteFrame", [[{"frame": 0.0}, "value", 6, 0]]]]
        ]),
    );
    write_doc(
        assets,
        "import/skel_goblin.json",
        &json!([
            0,
            ["abcd1234"],
            [
                0,
                "goblin",
                "\nsheet.png\nsize: 8,8\nformat: RGBA8888\n",
                ["goblin.png"],
                {"skeleton": {"spine": "3.8"}},
                [0]
            ]
        ]),
    );
}

#[test]
fn restores_all_output_categories() {
    let tmp = TempDir::new().unwrap();
    let assets = tmp.path().join("assets");
    let out = tmp.path().join("out");
    build_fixture(&assets);
    // Leftover texture from an earlier run; must be cleaned up.
    write(&out, "sprite_atlases/ab_abcd12/old.png", b"stale");

    let fetcher = StubFetcher::serving(b"FETCHED BYTES");
    let summary = run(
        &RestoreOptions {
            assets_root: assets,
            out_dir: out.clone(),
        },
        &fetcher,
    )
    .unwrap();

    assert_eq!(summary.audio_files, 1);
    assert_eq!(summary.skeleton_bundles, 1);
    assert_eq!(summary.atlas_groups, 2);
    assert_eq!(summary.authored_clips, 1);
    assert_eq!(summary.inferred_clips, 2);

    // Audio relocation.
    assert!(out.join("audio/bgm.mp3").exists());

    // Skeleton bundle folder with atlas text, skeleton JSON and the texture
    // matched by the declared atlas size.
    let spine = out.join("spine/goblin");
    assert!(fs::read_to_string(spine.join("goblin.atlas"))
        .unwrap()
        .contains("size: 8,8"));
    let skeleton: Value =
        serde_json::from_str(&fs::read_to_string(spine.join("goblin.json")).unwrap()).unwrap();
    assert_eq!(skeleton["skeleton"]["spine"], "3.8");
    assert_eq!(fs::read(spine.join("goblin.png")).unwrap(), png_bytes(8, 8));

    // Atlas folder for the genuine texture.
    let atlas = out.join("sprite_atlases/ab_abcd12");
    let plist = fs::read_to_string(atlas.join("atlas_abcd1234.plist")).unwrap();
    assert!(plist.contains("<key>glow_01</key>"));
    assert!(plist.contains("<key>logo</key>"));
    assert!(plist.contains("<string>sheet.png</string>"));
    // First-seen rect survives the duplicate in b_atlas.json.
    assert!(plist.contains("<string>{{0,0},{4,4}}</string>"));
    assert!(!plist.contains("{{99,0},{4,4}}"));
    assert!(atlas.join("sheet.png").exists());
    assert!(!atlas.join("old.png").exists());

    // Atlas folder for the stub texture: resolved through the fetcher.
    let stub_atlas = out.join("sprite_atlases/ef_efab99");
    assert!(stub_atlas.join("atlas_efab9999.plist").exists());
    assert_eq!(fs::read(stub_atlas.join("tex.png")).unwrap(), b"FETCHED BYTES");
    assert_eq!(
        fetcher.requests.borrow().as_slice(),
        ["https://cdn.example.com/fx.png"]
    );

    // Explicit clip with its category index.
    let clip: Value =
        serde_json::from_str(&fs::read_to_string(out.join("animations/run.anim.json")).unwrap())
            .unwrap();
    assert_eq!(clip["name"], "run");
    assert_eq!(clip["duration"], 1.5);
    assert_eq!(clip["source"], "authored");
    assert_eq!(clip["tracks"][0]["type"], "spriteFrame");
    assert_eq!(clip["tracks"][0]["frames"][0]["frame"], "abcd1234");
    let anim_index: Value =
        serde_json::from_str(&fs::read_to_string(out.join("animations/index.json")).unwrap())
            .unwrap();
    assert_eq!(anim_index["clips"].as_array().unwrap().len(), 1);

    // Inferred clips: glow (with the 05 straggler) and fx; logo has no
    // numeric suffix and yields nothing.
    let glow: Value = serde_json::from_str(
        &fs::read_to_string(out.join("animations_auto/glow.anim.guessed.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(glow["source"], "guessed");
    assert_eq!(glow["source_atlas"], "abcd1234");
    assert_eq!(glow["tracks"][0]["frames"].as_array().unwrap().len(), 4);
    assert!(out.join("animations_auto/fx.anim.guessed.json").exists());
    assert!(!out.join("animations_auto/logo.anim.guessed.json").exists());
    let auto_index: Value =
        serde_json::from_str(&fs::read_to_string(out.join("animations_auto/index.json")).unwrap())
            .unwrap();
    assert_eq!(auto_index["clips"].as_array().unwrap().len(), 2);
    assert!(auto_index["note"].as_str().unwrap().contains("best-effort"));
}

#[test]
fn missing_required_subtrees_abort() {
    let tmp = TempDir::new().unwrap();
    let assets = tmp.path().join("assets");
    fs::create_dir_all(assets.join("import")).unwrap();
    // No 'native' subtree.
    let fetcher = StubFetcher::serving(b"");
    let result = run(
        &RestoreOptions {
            assets_root: assets,
            out_dir: tmp.path().join("out"),
        },
        &fetcher,
    );
    assert!(result.is_err());
}

#[test]
fn unparseable_documents_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let assets = tmp.path().join("assets");
    write(&assets, "import/broken.json", b"{not json");
    write(&assets, "native/ab/.keep", b"");
    fs::remove_file(assets.join("native/ab/.keep")).unwrap();

    let fetcher = StubFetcher::serving(b"");
    let summary = run(
        &RestoreOptions {
            assets_root: assets,
            out_dir: tmp.path().join("out"),
        },
        &fetcher,
    )
    .unwrap();
    assert_eq!(summary.atlas_groups, 0);
    assert_eq!(summary.authored_clips, 0);
}
