//! Tests for the sound catalog

use super::*;

#[test]
fn test_default_catalog_has_all_sounds() {
    let catalog = SoundCatalog::with_base("/usr/share/r-ambient").unwrap();
    assert_eq!(catalog.len(), 12);
    assert!(catalog.contains("rain_in_the_forest"));
    assert!(catalog.contains("in_the_cafe"));
    assert_eq!(catalog.first().unwrap().id, "rain_in_the_forest");
}

#[test]
fn test_resolve_unknown_sound() {
    let catalog = SoundCatalog::with_base(".").unwrap();
    let err = catalog.resolve("thunder").unwrap_err();
    assert_eq!(err, CatalogError::UnknownSound("thunder".to_string()));
    assert_eq!(err.to_string(), "Unknown sound: thunder");
}

#[test]
fn test_file_locator_joins_base_directory() {
    let catalog = SoundCatalog::with_base("/opt/relax").unwrap();
    let sound = catalog.resolve("crickets").unwrap();
    assert_eq!(
        sound.locator,
        Locator::File(PathBuf::from("/opt/relax/sounds/crickets.mp3"))
    );
    assert_eq!(sound.locator.extension().as_deref(), Some("mp3"));
}

#[test]
fn test_http_locator_keeps_base_path() {
    let locator = Locator::resolve("https://cdn.example.com/relax", "sounds/wave_noise.mp3").unwrap();
    match locator {
        Locator::Http(url) => {
            assert_eq!(url.as_str(), "https://cdn.example.com/relax/sounds/wave_noise.mp3")
        }
        other => panic!("expected http locator, got {:?}", other),
    }
}

#[test]
fn test_empty_base_is_rejected() {
    assert!(matches!(
        SoundCatalog::with_base(""),
        Err(CatalogError::InvalidBase(_))
    ));
}

#[test]
fn test_cycling_wraps_around() {
    let catalog = SoundCatalog::with_base(".").unwrap();
    assert_eq!(catalog.next_after(None).unwrap().id, "rain_in_the_forest");
    assert_eq!(catalog.next_after(Some("in_the_cafe")).unwrap().id, "rain_in_the_forest");
    assert_eq!(catalog.next_after(Some("crickets")).unwrap().id, "cicadas");
    assert_eq!(catalog.previous_before(Some("rain_in_the_forest")).unwrap().id, "in_the_cafe");
    assert_eq!(catalog.previous_before(Some("cicadas")).unwrap().id, "crickets");
}
