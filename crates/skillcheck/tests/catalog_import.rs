use skillcheck::checklist::{Catalog, CatalogError, ItemId, Level, Sheet};
use std::fs;
use std::path::Path;

const HEADER: &str = "データサイエンティスト スキルチェックリスト,,,,,\n注記,,,,,\n";

fn write_sheet(dir: &Path, sheet: Sheet, body: &str) {
    fs::write(
        dir.join(format!("{}.csv", sheet.file_stem())),
        format!("{HEADER}{body}"),
    )
    .expect("fixture written");
}

#[test]
fn bundled_catalog_loads_every_sheet() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog");
    let catalog = Catalog::from_dir(&dir).expect("bundled catalog parses");

    for sheet in Sheet::ordered() {
        let items = catalog.items(sheet);
        assert!(!items.is_empty(), "{sheet} has items");
        assert!(items.iter().all(|item| item.sheet == sheet));
        assert!(items.iter().any(|item| item.required));
    }
    assert_eq!(
        catalog.categories(Sheet::Business).first().copied(),
        Some("行動規範")
    );
}

#[test]
fn english_headers_and_numeric_ids_are_accepted() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_sheet(
        dir.path(),
        Sheet::Business,
        "no,category,subcategory,level,check_item,required\n\
         1.0,Mindset,Ethics,1,Handles personal data lawfully,yes\n\
         2,Mindset,Ethics,★★★,Sets data governance policy,\n",
    );
    write_sheet(
        dir.path(),
        Sheet::DataScience,
        "NO,スキルカテゴリ,サブカテゴリ,スキルレベル,チェック項目,必須\n",
    );
    write_sheet(
        dir.path(),
        Sheet::DataEngineering,
        "NO,スキルカテゴリ,サブカテゴリ,スキルレベル,チェック項目,必須\n",
    );

    let catalog = Catalog::from_dir(dir.path()).expect("catalog parses");
    let items = catalog.items(Sheet::Business);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, ItemId(1));
    assert!(items[0].required);
    assert_eq!(items[1].level, Level::Three);
    assert!(!items[1].required);
    assert!(catalog.items(Sheet::DataScience).is_empty());
    assert_eq!(catalog.len(), 2);
}

#[test]
fn missing_sheet_file_names_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_sheet(
        dir.path(),
        Sheet::Business,
        "NO,スキルカテゴリ,サブカテゴリ,スキルレベル,チェック項目,必須\n",
    );

    let err = Catalog::from_dir(dir.path()).expect_err("data_science.csv is missing");
    match err {
        CatalogError::Io { path, .. } => assert!(path.ends_with("data_science.csv")),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn bad_level_reports_the_offending_line() {
    let csv = format!(
        "{HEADER}NO,スキルカテゴリ,サブカテゴリ,スキルレベル,チェック項目,必須\n\
         1,統計数理,基礎,★,平均と分散を説明できる,\n\
         2,統計数理,基礎,★★★★,分布を推定できる,\n"
    );
    let err = Catalog::from_readers([(Sheet::DataScience, csv.as_bytes())])
        .expect_err("four stars is not a level");
    match err {
        CatalogError::MalformedRow { sheet, line, .. } => {
            assert_eq!(sheet, Sheet::DataScience);
            assert_eq!(line, 5);
        }
        other => panic!("unexpected error {other}"),
    }
}
