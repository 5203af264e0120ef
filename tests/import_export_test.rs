mod common;

use anyhow::Result;
use common::{app_order_doc, at, seed_orders, test_service};
use salesdesk::domain::{MonthlySortKey, SortDescriptor};
use salesdesk::io::{Exporter, ImportOptions, Importer};
use salesdesk::storage::Collection;
use serde_json::{json, Value};

#[tokio::test]
async fn test_import_orders_json_array() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let input = json!([
        {"id": "o1", "status": "completed", "createdAt": "2024-03-01T10:00:00Z", "totalAmount": 500},
        {"id": "o2", "status": "pending", "totalAmount": 900},
        {"id": "bad", "status": "completed", "totalAmount": -10},
        {"status": "completed", "totalAmount": 100}
    ])
    .to_string();

    let importer = Importer::new(&service);
    let result = importer
        .import_documents_json(input.as_bytes(), Collection::Orders, ImportOptions::default())
        .await?;

    assert_eq!(result.imported, 3);
    assert_eq!(result.skipped, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line, 3);

    assert_eq!(service.count_documents(Collection::Orders).await?, 3);
    assert!(service.document_exists(Collection::Orders, "o1").await?);
    assert!(!service.document_exists(Collection::Orders, "bad").await?);

    Ok(())
}

#[tokio::test]
async fn test_import_object_map_with_skip_existing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_orders(
        &service,
        vec![("o1", app_order_doc("completed", "2024-03-01T10:00:00Z", 500, "a1", "A"))],
    )
    .await?;

    let input = json!({
        "o1": {"status": "completed", "totalAmount": 99999},
        "o2": {"status": "completed", "totalAmount": 700}
    })
    .to_string();

    let options = ImportOptions {
        skip_existing: true,
        ..Default::default()
    };
    let result = Importer::new(&service)
        .import_documents_json(input.as_bytes(), Collection::Orders, options)
        .await?;

    assert_eq!(result.imported, 1);
    assert_eq!(result.skipped, 1);

    let orders = service.list_orders(&chrono::Utc).await?;
    let o1 = orders.iter().find(|o| o.id == "o1").unwrap();
    assert_eq!(o1.total_amount, 500);

    Ok(())
}

#[tokio::test]
async fn test_dry_run_writes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let input = json!([{"id": "x", "description": "Ads", "amount": 100, "date": "2024-03-01"}])
        .to_string();
    let options = ImportOptions {
        dry_run: true,
        ..Default::default()
    };
    let result = Importer::new(&service)
        .import_documents_json(input.as_bytes(), Collection::Expenses, options)
        .await?;

    assert_eq!(result.imported, 1);
    assert_eq!(service.count_documents(Collection::Expenses).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_import_rejects_non_collection_json() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = Importer::new(&service)
        .import_documents_json("42".as_bytes(), Collection::Orders, ImportOptions::default())
        .await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_import_expenses_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let csv = "date,description,category,amount\n\
               2024-03-01,Ads,marketing,\"1,250.50\"\n\
               2024-03-02,Hosting,,99\n\
               2024-03-03,Broken,misc,abc\n\
               03/04/2024,Wrong date,misc,10\n";

    let result = Importer::new(&service)
        .import_expenses_csv(csv.as_bytes(), ImportOptions::default())
        .await?;

    assert_eq!(result.imported, 2);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].line, 4);
    assert_eq!(result.errors[0].field.as_deref(), Some("amount"));
    assert_eq!(result.errors[1].line, 5);

    let expenses = service.list_expenses(None).await?;
    let ads = expenses.iter().find(|e| e.description == "Ads").unwrap();
    assert_eq!(ads.amount, 125050);
    let hosting = expenses.iter().find(|e| e.description == "Hosting").unwrap();
    assert_eq!(hosting.category, "uncategorized");
    assert_eq!(hosting.amount, 9900);

    Ok(())
}

#[tokio::test]
async fn test_export_monthly_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_orders(
        &service,
        vec![
            ("o1", app_order_doc("completed", "2024-02-10T10:00:00Z", 30000, "a1", "A")),
            ("o2", app_order_doc("completed", "2024-03-10T10:00:00Z", 12345, "a1", "A")),
        ],
    )
    .await?;
    service
        .add_expense("Ads".into(), "marketing".into(), 5000, "2024-03-05".into())
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_monthly_csv(
            &mut buffer,
            at("2024-03-20T10:00:00Z"),
            SortDescriptor::descending(MonthlySortKey::Month),
        )
        .await?;
    assert_eq!(count, 2);

    let output = String::from_utf8(buffer)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "month,sales,transactions,expenses,profit");
    assert_eq!(lines[1], "2024-03,123.45,1,50.00,73.45");
    assert_eq!(lines[2], "2024-02,300.00,1,0.00,300.00");

    Ok(())
}

#[tokio::test]
async fn test_export_expenses_and_today_items() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_orders(
        &service,
        vec![("o1", app_order_doc("completed", "2024-03-10T10:00:00Z", 700, "a1", "App One"))],
    )
    .await?;
    service
        .add_expense("Old".into(), "misc".into(), 100, "2024-01-01".into())
        .await?;
    service
        .add_expense("New".into(), "misc".into(), 200, "2024-03-01".into())
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_expenses_csv(&mut buffer)
        .await?;
    assert_eq!(count, 2);
    let output = String::from_utf8(buffer)?;
    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[1].contains(",2024-03-01,New,misc,2.00"));
    assert!(lines[2].contains(",2024-01-01,Old,misc,1.00"));

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_today_items_csv(&mut buffer, at("2024-03-10T18:00:00Z"))
        .await?;
    assert_eq!(count, 1);
    let output = String::from_utf8(buffer)?;
    assert_eq!(output.lines().nth(1), Some("app_a1,App One,7.00"));

    Ok(())
}

#[tokio::test]
async fn test_export_summary_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_orders(
        &service,
        vec![("o1", app_order_doc("completed", "2024-03-10T10:00:00Z", 700, "a1", "App One"))],
    )
    .await?;

    let mut buffer = Vec::new();
    let summary = Exporter::new(&service)
        .export_summary_json(
            &mut buffer,
            at("2024-03-10T18:00:00Z"),
            SortDescriptor::descending(MonthlySortKey::Month),
        )
        .await?;
    assert_eq!(summary.today_sales, 700);

    let parsed: Value = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed["today_sales"], json!(700));
    assert_eq!(parsed["monthly_report"][0]["month"], json!("2024-03"));

    Ok(())
}

#[tokio::test]
async fn test_csv_exports_quote_free_text() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .add_expense("Ads, Meta".into(), "marketing".into(), 1500, "2024-03-01".into())
        .await?;
    seed_orders(
        &service,
        vec![(
            "o1",
            json!({
                "status": "completed",
                "createdAt": "2024-03-01T10:00:00Z",
                "totalAmount": 20000,
                "consultantId": "c-1",
                "platformFee": 4000,
                "items": [{
                    "appId": "k1", "price": 20000, "isConsultation": true,
                    "consultantName": "Rao, Dr.", "packageId": "p1"
                }]
            }),
        )],
    )
    .await?;

    let exporter = Exporter::new(&service);

    let mut buffer = Vec::new();
    exporter.export_expenses_csv(&mut buffer).await?;
    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let record = reader.records().next().unwrap()?;
    assert_eq!(record.len(), 5);
    assert_eq!(&record[2], "Ads, Meta");
    assert_eq!(&record[3], "marketing");
    assert_eq!(&record[4], "15.00");

    let mut buffer = Vec::new();
    let count = exporter
        .export_consultants_csv(&mut buffer, &chrono::Utc)
        .await?;
    assert_eq!(count, 1);
    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let record = reader.records().next().unwrap()?;
    assert_eq!(record.len(), 9);
    assert_eq!(&record[1], "Rao, Dr.");
    assert_eq!(&record[5], "160.00");

    Ok(())
}
