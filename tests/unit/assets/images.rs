use super::*;

fn tiny_png() -> Vec<u8> {
    decode::encode_png_rgba8(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap()
}

#[test]
fn uploads_are_content_addressed_and_not_decoded_eagerly() {
    let table = ImageTable::new();
    let a = table.insert_upload(tiny_png()).unwrap();
    let b = table.insert_upload(tiny_png()).unwrap();
    assert_eq!(a, b);
    assert_eq!(table.len(), 1);
    assert!(table.cached(a).unwrap().is_none());
    assert_eq!(table.origin(a).unwrap(), ImageOrigin::Upload);
}

#[tokio::test]
async fn garbage_upload_is_accepted_but_fails_to_decode() {
    let table = ImageTable::new();
    let id = table.insert_upload(b"not an image".to_vec()).unwrap();
    assert!(matches!(table.decode(id).await, Err(CoverError::Decode(_))));
    assert!(table.cached(id).unwrap().is_none());
    assert!(table.insert_upload(Vec::new()).is_err());
}

#[tokio::test]
async fn async_decode_caches_pixels() {
    let table = ImageTable::new();
    let id = table.insert_upload(tiny_png()).unwrap();

    let img = table.decode(id).await.unwrap();
    assert_eq!((img.width, img.height), (2, 1));
    let cached = table.cached(id).unwrap().unwrap();
    assert!(Arc::ptr_eq(&img, &cached));
}

#[test]
fn baked_refs_depend_on_source_and_params() {
    let src = ImageRef::from_u64(7);
    let p1 = FilterParams::new(10.0, 50.0);
    let p2 = FilterParams::new(10.0, 60.0);
    assert_eq!(baked_ref(src, p1), baked_ref(src, p1));
    assert_ne!(baked_ref(src, p1), baked_ref(src, p2));
    assert_ne!(baked_ref(src, p1), baked_ref(ImageRef::from_u64(8), p1));
}

#[test]
fn release_removes_entries() {
    let table = ImageTable::new();
    let id = table.insert_upload(tiny_png()).unwrap();
    assert!(table.release(id));
    assert!(!table.release(id));
    assert!(!table.contains(id));
    assert!(table.bytes(id).is_err());
}
