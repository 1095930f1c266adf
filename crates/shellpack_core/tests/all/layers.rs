//! The three configuration layers feed one registry; later layers replace
//! earlier declarations of the same name in full.

use shellpack_core::fs_utils::Utf8TempDir;
use shellpack_core::{Dirs, Manager, RefSpec};

struct LayerFixture {
    temp: Utf8TempDir,
}

impl LayerFixture {
    fn new() -> Self {
        test_logs::init();
        Self {
            temp: Utf8TempDir::new().unwrap(),
        }
    }

    fn dirs(&self) -> Dirs {
        Dirs {
            config_dir: self.temp.path().join("config"),
            data_dir: self.temp.path().join("data"),
            shell_suffix: "zsh".to_string(),
        }
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.dirs().config_dir.join(relative);
        fs_err::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
        fs_err::write(path.as_std_path(), contents).unwrap();
    }

    fn ingest(&self) -> Manager {
        let mut manager = Manager::new(self.dirs());
        manager.ingest().unwrap();
        manager
    }
}

#[test]
fn the_filesystem_layer_overrides_the_script_layer() {
    let fixture = LayerFixture::new();
    fixture.write("config", "pack user/repo branch=main env=(FROM_SCRIPT=1)\n");
    fixture.write("packages/repo/source", "user/repo\n");
    fixture.write("packages/repo/tag", "v2\n");

    let manager = fixture.ingest();
    let (package, config) = manager.registry.lookup("repo").unwrap();
    // The second declaration wins in full: tag set, branch and env gone.
    assert_eq!(package.ref_spec, RefSpec::Tag("v2".to_string()));
    assert!(config.env.is_empty());
}

#[test]
fn the_aggregation_layer_has_the_last_word() {
    let fixture = LayerFixture::new();
    fixture.write("config", "pack user/repo branch=script\n");
    fixture.write("packages/repo/source", "user/repo\n");
    fixture.write("packages/repo/branch", "tree\n");
    fixture.write("pkgs.d/50-final.zsh", "pack user/repo branch=aggregated\n");

    let manager = fixture.ingest();
    let (package, _) = manager.registry.lookup("repo").unwrap();
    assert_eq!(package.ref_spec, RefSpec::Branch("aggregated".to_string()));
}

#[test]
fn layers_accumulate_distinct_packages() {
    let fixture = LayerFixture::new();
    fixture.write("config", "pack user/from-script\n");
    fixture.write("packages/from-tree/source", "user/from-tree\n");
    fixture.write("pkgs.d/10-extra.zsh", "pack user/from-aggregate\n");

    let manager = fixture.ingest();
    assert!(manager.registry.contains("from-script"));
    assert!(manager.registry.contains("from-tree"));
    assert!(manager.registry.contains("from-aggregate"));
}

#[test]
fn a_bad_declaration_does_not_poison_the_rest() {
    let fixture = LayerFixture::new();
    fixture.write(
        "config",
        "pack user/bad as='no good'\npack user/fine\n",
    );

    let mut manager = Manager::new(fixture.dirs());
    let report = manager.ingest().unwrap();
    assert_eq!(report.declared, 1);
    assert_eq!(report.rejected, 1);
    assert!(manager.registry.contains("fine"));
}
