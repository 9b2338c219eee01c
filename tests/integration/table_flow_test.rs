//! Integration test for the full dataset → stage selection → rendered
//! table → export flow.

#[cfg(test)]
mod tests {
    use funnel_core::config::{ExportFormat, TableConfig};
    use funnel_core::types::{AttributionRow, ItemTitle, StageKey};
    use funnel_reporting::columns::{Accessor, CellFormat, ColumnDef, ColumnId, Footer};
    use funnel_reporting::export::export;
    use funnel_reporting::{AttributionTable, FnAccessors, RowAccessors, TableProps};

    /// A month of channel-level attribution data.
    fn sample_dataset() -> Vec<AttributionRow> {
        serde_json::from_str(
            r#"[
                {"title": "Google Ads", "cost": 12000, "webVisits": 3400, "impressions": 90000,
                 "clicks": 5100, "MCL": 120, "influencedMCL": 300, "MQL": 48, "SQL": 20,
                 "opps": 8, "influencedOpps": 15, "pipeline": 64000, "users": 3,
                 "influencedUsers": 6, "revenue": 36000, "influencedRevenue": 90000, "LTV": 108000},
                {"title": "content marketing", "cost": 4000, "webVisits": 2100, "MCL": 80,
                 "influencedMCL": 260, "MQL": 30, "SQL": 12, "opps": 5, "pipeline": 30000,
                 "users": 2, "revenue": 18000, "LTV": 54000},
                {"title": "Conferences", "cost": 25000, "MCL": 0, "opps": 2, "pipeline": 80000},
                {"title": "Direct", "source": "organic", "webVisits": 900, "SQL": null},
                {"title": "Billboards", "cost": 15000}
            ]"#,
        )
        .expect("sample dataset parses")
    }

    fn titles(table: &AttributionTable<'_, AttributionRow>, data: &[AttributionRow]) -> Vec<String> {
        table
            .render()
            .unwrap()
            .rows
            .iter()
            .map(|row| data[row.item_index].title.clone())
            .collect()
    }

    #[test]
    fn test_stage_switch_changes_rows_and_columns() {
        let data = sample_dataset();
        let mut table = AttributionTable::new(&data, TableProps::new("Channel", RowAccessors));

        assert_eq!(
            titles(&table, &data),
            vec!["content marketing", "Google Ads"]
        );

        table.select_stage(StageKey::Opps);
        let view = table.render().unwrap();
        assert_eq!(
            titles(&table, &data),
            vec!["Conferences", "content marketing", "Google Ads"]
        );
        assert_eq!(view.footer(&ColumnId::Cost), Some("$41,000"));
        assert_eq!(view.footer(&ColumnId::Pipeline), Some("$174,000"));
        assert_eq!(view.column_ids().last(), Some(&"on-click"));

        table.select_stage(StageKey::WebVisits);
        let view = table.render().unwrap();
        assert_eq!(
            view.column_ids(),
            vec!["row-title", "cost", "stage-indicator", "efficiency"]
        );
        assert_eq!(view.rows.len(), 3);
    }

    #[test]
    fn test_stage_selector_totals() {
        let data = sample_dataset();
        let table = AttributionTable::new(&data, TableProps::new("Channel", RowAccessors));
        let view = table.render().unwrap();
        let numbers: Vec<(StageKey, &str)> = view
            .stages
            .iter()
            .map(|stage| (stage.key, stage.number.as_str()))
            .collect();
        assert_eq!(
            numbers,
            vec![
                (StageKey::WebVisits, "6,400"),
                (StageKey::Mcl, "200"),
                (StageKey::Mql, "78"),
                (StageKey::Sql, "32"),
                (StageKey::Opps, "15"),
                (StageKey::Users, "5"),
            ]
        );
    }

    #[test]
    fn test_paying_accounts_metrics() {
        let data = sample_dataset();
        let table = AttributionTable::new(
            &data,
            TableProps::new("Channel", RowAccessors).default_stage(StageKey::Users),
        );
        let view = table.render().unwrap();

        // Google Ads sorts after "content marketing"
        assert_eq!(view.cell(1, &ColumnId::RowTitle), Some("Google Ads"));
        assert_eq!(view.cell(1, &ColumnId::Roi), Some("3x"));
        assert_eq!(view.cell(1, &ColumnId::Arpa), Some("$12,000"));
        assert_eq!(view.cell(1, &ColumnId::Ltv), Some("$108,000"));
        assert_eq!(view.cell(1, &ColumnId::Efficiency), Some("$4,000 per Paying Account"));
        assert_eq!(view.footer(&ColumnId::Revenue), Some("$54,000"));
        assert_eq!(view.footer(&ColumnId::InfluencedRevenue), Some("$90,000"));
    }

    #[test]
    fn test_web_visit_extra_columns_with_custom_accessors() {
        let data = sample_dataset();
        let extra = |id: &str, label: &str| {
            ColumnDef::new(id, label, Accessor::field(id), CellFormat::Number).with_footer(
                Footer::Sum {
                    accessor: Accessor::field(id),
                    format: CellFormat::Number,
                },
            )
        };
        let accessors = FnAccessors::new(
            |row: &AttributionRow| row.cost,
            |row: &AttributionRow| ItemTitle::plain(row.title.to_uppercase()),
        );
        let props = TableProps::new("Channel", accessors)
            .web_visits_columns(vec![extra("clicks", "Clicks"), extra("impressions", "Impressions")])
            .default_stage(StageKey::WebVisits);
        let view = AttributionTable::new(&data, props).render().unwrap();

        assert_eq!(
            view.column_ids(),
            vec!["row-title", "cost", "impressions", "clicks", "stage-indicator", "efficiency"]
        );
        assert_eq!(view.cell(0, &ColumnId::RowTitle), Some("CONTENT MARKETING"));
        assert_eq!(view.footer(&ColumnId::from("impressions")), Some("90,000"));
        assert_eq!(view.footer(&ColumnId::from("clicks")), Some("5,100"));
    }

    #[test]
    fn test_config_driven_table_without_costs() {
        let data = sample_dataset();
        let config = TableConfig {
            default_stage: StageKey::Opps,
            show_cost_columns: false,
            show_total_row: false,
            data_nickname: "Campaign".to_string(),
            title: Some("Campaign impact".to_string()),
            ..Default::default()
        };
        let view = AttributionTable::new(&data, TableProps::from_config(&config, RowAccessors))
            .render()
            .unwrap();

        assert_eq!(view.selected_stage, StageKey::Opps);
        assert_eq!(view.columns[0].header.label, "Campaign");
        assert_eq!(
            view.column_ids(),
            vec![
                "row-title",
                "influenced-stage-indicator",
                "stage-indicator",
                "pipeline",
                "on-click"
            ]
        );
        assert!(view.columns.iter().all(|column| column.footer.is_empty()));

        let csv = export(&view, ExportFormat::Csv, true).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.starts_with("Campaign,Touched Opportunities,Attributed Opportunities,Pipeline"));
    }
}
