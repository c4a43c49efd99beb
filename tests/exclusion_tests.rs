//! Integration tests for device and filesystem exclusion.

use herakles_disk_check::{DiskCandidate, ExclusionConfig, InstanceConfig, Platform};

fn exclusion() -> ExclusionConfig {
    let instance = InstanceConfig {
        use_mount: Some(false),
        excluded_filesystems: vec!["aaaaaa".into()],
        excluded_disks: vec!["bbbbbb".into()],
        excluded_disk_re: Some("^tev+$".into()),
        ..Default::default()
    };
    ExclusionConfig::load(&instance, None).expect("valid instance")
}

#[test]
fn test_regular_disk_passes() {
    assert!(!exclusion().should_exclude("/dev/sda1", "ext4"));
}

#[test]
fn test_fake_devices_excluded() {
    let ex = exclusion();
    for device in ["udev", "sysfs", "rpc_pipefs", "proc", "devpts"] {
        assert!(ex.should_exclude(device, "ext4"), "{} should be excluded", device);
    }
}

#[test]
fn test_excluded_filesystems_exact_match() {
    let ex = exclusion();
    assert!(ex.should_exclude("/dev/sda1", "aaaaaa"));
    assert!(!ex.should_exclude("/dev/sda1", "a"));
}

#[test]
fn test_excluded_disks_exact_match() {
    let ex = exclusion();
    assert!(ex.should_exclude("bbbbbb", "ext4"));
    assert!(!ex.should_exclude("b", "ext4"));
}

#[test]
fn test_excluded_disk_regex() {
    let ex = exclusion();
    assert!(ex.should_exclude("tevvv", "ext4"));
    assert!(!ex.should_exclude("tevvs", "ext4"));
}

#[test]
fn test_regex_is_anchored_at_start_only() {
    let instance = InstanceConfig {
        excluded_disk_re: Some("zroot/.+".into()),
        ..Default::default()
    };
    let ex = ExclusionConfig::load(&instance, None).unwrap();
    assert!(ex.should_exclude("zroot/usr/home", "zfs"));
    assert!(!ex.should_exclude("zroot", "zfs"));
    assert!(!ex.should_exclude("pool/zroot/tmp", "zfs"));
}

#[test]
fn test_legacy_pattern_applies_only_without_instance_pattern() {
    let plain = InstanceConfig::default();
    let ex = ExclusionConfig::load(&plain, Some("^/dev/loop")).unwrap();
    assert!(ex.should_exclude("/dev/loop0", "squashfs"));

    let explicit = InstanceConfig {
        excluded_disk_re: Some("^/dev/sdz".into()),
        ..Default::default()
    };
    let ex = ExclusionConfig::load(&explicit, Some("^/dev/loop")).unwrap();
    assert!(!ex.should_exclude("/dev/loop0", "squashfs"));
    assert!(ex.should_exclude("/dev/sdz1", "ext4"));
}

#[test]
fn test_invalid_regex_rejected() {
    let instance = InstanceConfig {
        excluded_disk_re: Some("([".into()),
        ..Default::default()
    };
    assert!(ExclusionConfig::load(&instance, None).is_err());
}

#[test]
fn test_windows_unready_drives_skipped() {
    let ex = exclusion();
    let cdrom = DiskCandidate::new("D:\\", "", "D:\\").with_options(["cdrom"]);
    let no_fs = DiskCandidate::new("E:\\", "", "E:\\");
    let ntfs = DiskCandidate::new("C:\\", "NTFS", "C:\\").with_options(["rw", "fixed"]);

    assert!(ex.should_exclude_partition(&cdrom, Platform::Windows));
    assert!(ex.should_exclude_partition(&no_fs, Platform::Windows));
    assert!(!ex.should_exclude_partition(&ntfs, Platform::Windows));

    // The optical drive rule is Windows only.
    assert!(!ex.should_exclude_partition(&no_fs, Platform::Unix));
}
