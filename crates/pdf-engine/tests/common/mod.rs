#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A PDF with `pages` pages of `width` x `height` points, each carrying a
/// small content stream and a resource dictionary shared through the page tree
pub fn create_test_pdf(pages: usize, width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), b"0.9 g 0 0 50 50 re f".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            Object::Reference(page_id)
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => dictionary! {},
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save should succeed");
    buffer
}

/// Operator names of a page's decoded content, in drawing order
pub fn page_operators(pdf: &[u8], page_number: u32) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("reload should succeed");
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_and_decode_page_content(page_id).expect("content should decode");
    content.operations.into_iter().map(|op| op.operator).collect()
}

/// Names in one category of a page's own resource dictionary
pub fn resource_names(pdf: &[u8], page_number: u32, category: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("reload should succeed");
    let page_id = doc.get_pages()[&page_number];
    let page = doc.get_dictionary(page_id).expect("page dict");
    let Ok(resources) = page.get(b"Resources").and_then(Object::as_dict) else {
        return Vec::new();
    };
    let Ok(entries) = resources.get(category).and_then(Object::as_dict) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries.iter().map(|(k, _)| String::from_utf8_lossy(k).into_owned()).collect();
    names.sort();
    names
}
