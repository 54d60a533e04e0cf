//! Export integration tests.

#![allow(clippy::unwrap_used)]

use std::io::Read;

use photo_sieve_core::{export, FailureKind, ImageRef, PhotoLibrary};
use photo_sieve_test_support::{MemoryDestination, MockPhotoLibrary};

fn seeded_library() -> (MockPhotoLibrary, Vec<ImageRef>) {
    let library = MockPhotoLibrary::new();
    let mut images = Vec::new();
    for i in 0..4u8 {
        let image = ImageRef::new(format!("{i}"), format!("mock://{i}"));
        let bytes: Vec<u8> = (0..=255u8).map(|b| b.wrapping_mul(i + 1)).collect();
        library.add_named(image.clone(), bytes, format!("IMG_{i}.jpg"));
        images.push(image);
    }
    (library, images)
}

fn bytes_of(library: &MockPhotoLibrary, image: &ImageRef) -> Vec<u8> {
    let mut out = Vec::new();
    library.open(image).unwrap().read_to_end(&mut out).unwrap();
    out
}

#[test]
fn test_every_copy_is_byte_identical() {
    let (library, images) = seeded_library();
    let dest = MemoryDestination::new();

    let report = export(&library, &images, &dest);

    assert_eq!(report.requested, 4);
    assert_eq!(report.success_count(), 4);
    assert!(report.failed.is_empty());
    for item in &report.copied {
        let copy = dest.file(&item.file_name).unwrap();
        assert_eq!(copy, bytes_of(&library, &item.source));
        assert_eq!(item.bytes, copy.len() as u64);
    }
    assert!(dest.file("IMG_2.jpg").is_some());
}

#[test]
fn test_failures_count_against_success() {
    let (library, mut images) = seeded_library();
    images.push(ImageRef::new("gone", "mock://gone"));
    let dest = MemoryDestination::new();
    dest.fail_create("IMG_1.jpg");

    let report = export(&library, &images, &dest);

    assert_eq!(report.requested, 5);
    assert_eq!(report.success_count(), 3);
    assert_eq!(report.failed.len(), 2);
    assert!(report
        .failed
        .iter()
        .all(|(_, e)| e.kind() == FailureKind::Export));
    assert!(report.success_count() <= report.requested);
}

#[test]
fn test_failed_write_is_not_rolled_back() {
    let (library, images) = seeded_library();
    let dest = MemoryDestination::new();
    dest.fail_write("IMG_0.jpg");

    let report = export(&library, &images[..1], &dest);

    assert_eq!(report.success_count(), 0);
    assert_eq!(dest.file("IMG_0.jpg").unwrap(), Vec::<u8>::new());
}

#[test]
fn test_unnamed_item_gets_generated_name() {
    let library = MockPhotoLibrary::new();
    let image = ImageRef::new("anon", "mock://anon");
    library.add_newest(image.clone(), vec![1, 2, 3]);
    let dest = MemoryDestination::new();

    let report = export(&library, &[image], &dest);

    let name = &report.copied[0].file_name;
    assert!(name.starts_with("image_") && name.ends_with(".jpg"), "{name}");
    assert_eq!(dest.file(name).unwrap(), [1, 2, 3]);
}

#[test]
fn test_same_name_twice_keeps_both() {
    let library = MockPhotoLibrary::new();
    let a = ImageRef::new("a", "mock://a");
    let b = ImageRef::new("b", "mock://b");
    library.add_named(a.clone(), vec![1], "same.jpg");
    library.add_named(b.clone(), vec![2], "same.jpg");
    let dest = MemoryDestination::new();

    let report = export(&library, &[a, b], &dest);

    assert_eq!(report.success_count(), 2);
    assert_eq!(dest.files().len(), 2);
}

#[test]
fn test_empty_selection() {
    let (library, _) = seeded_library();
    let report = export(&library, &[], &MemoryDestination::new());
    assert_eq!(report.requested, 0);
    assert_eq!(report.success_count(), 0);
}
