use super::*;

#[test]
fn defaults_match_cli_defaults() {
    let cfg = QcConfig::new("/study");
    assert_eq!(cfg.modality, "FA");
    assert_eq!(cfg.workers, 4);
    assert_eq!(cfg.cut_coords, "auto");
    assert_eq!(cfg.pairing, PairingMode::ByCase);
    assert_eq!(cfg.on_failure, FailurePolicy::Abort);
    assert_eq!(cfg.layout.image_ext, "nii.gz");
}

#[test]
fn derived_paths() {
    let mut cfg = QcConfig::new("/study");
    cfg.modality = "MD".to_string();
    assert_eq!(cfg.modality_dir(), PathBuf::from("/study/MD"));
    assert_eq!(cfg.output_dir(), PathBuf::from("/study/MD/slicesdir"));
    assert_eq!(cfg.cases_path(), PathBuf::from("/study/log/caselist.txt"));

    cfg.cases_path = Some(PathBuf::from("/elsewhere/cases.txt"));
    assert_eq!(cfg.cases_path(), PathBuf::from("/elsewhere/cases.txt"));
}

#[test]
fn validate_resolves_coordinate() {
    let mut cfg = QcConfig::new("/study");
    cfg.cut_coords = "enigma".to_string();
    assert_eq!(cfg.validate().unwrap(), ViewCoordinate::Mm(1, -19, 14));
}

#[test]
fn validate_rejects_bad_settings() {
    let mut cfg = QcConfig::new("/study");
    cfg.workers = 0;
    assert!(matches!(cfg.validate().unwrap_err(), QcError::Config(_)));

    let mut cfg = QcConfig::new("/study");
    cfg.cut_coords = "1,-19".to_string();
    assert!(matches!(cfg.validate().unwrap_err(), QcError::Config(_)));

    let mut cfg = QcConfig::new("/study");
    cfg.layout.image_ext = ".nii.gz".to_string();
    assert!(cfg.validate().is_err());

    let mut cfg = QcConfig::new("/study");
    cfg.modality.clear();
    assert!(cfg.validate().is_err());
}
