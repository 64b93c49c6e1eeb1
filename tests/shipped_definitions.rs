use std::fs;
use std::path::Path;

use data_crew::{config::CrewConfig, crew::create_data_analysis_crew};
use tempfile::tempdir;

#[test]
fn shipped_config_builds_the_three_agent_crew() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = CrewConfig::load(&root.join("config.json")).unwrap();

    let knowledge = tempdir().unwrap();
    fs::write(
        knowledge.path().join("procurement.csv"),
        "Item_Category,Order_Status,Quantity\nRaw Materials,Delivered,120\nOffice Supplies,Pending,8\n",
    )
    .unwrap();

    let crew =
        create_data_analysis_crew(&config, knowledge.path(), Path::new("procurement.csv")).unwrap();

    let roles: Vec<&str> = crew.agents().iter().map(|a| a.role.as_str()).collect();
    assert_eq!(
        roles,
        vec![
            "Data Retriever Specialist",
            "Senior Data Analyst",
            "Technical Report Writer"
        ]
    );

    let tasks = crew.tasks();
    assert_eq!(tasks.len(), 3);
    assert!(tasks[0].description.contains("{question}"));
    assert!(tasks[0].context.is_empty());
    assert_eq!(tasks[1].context, vec![0]);
    assert_eq!(tasks[2].context, vec![1]);
    assert_eq!(tasks[2].agent.name, "report_writer");
}
