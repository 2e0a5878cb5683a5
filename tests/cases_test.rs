mod common;

use serde_json::{json, Value};

use common::{create_case, create_evidence, create_timeline_event, register_user, spawn_app};

#[tokio::test]
async fn investigation_lifecycle_keeps_counters_in_sync() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, user_id) = register_user(&base, &client, "analyst@forensics.io").await;

    // Lowercase severity is accepted and canonicalized.
    let case = create_case(&base, &client, &token, "S3 Bucket Breach", "critical").await;
    let case_id = case["id"].as_str().unwrap().to_string();
    assert_eq!(case["severity"], "CRITICAL");
    assert_eq!(case["status"], "OPEN");
    assert_eq!(case["evidenceCount"], 0);
    assert_eq!(case["createdBy"]["id"], user_id.as_str());

    let evidence = create_evidence(&base, &client, &token, &case_id, "cloudtrail.json").await;
    assert_eq!(evidence["type"], "LOG");
    assert_eq!(evidence["case"]["id"], case_id.as_str());
    let custody = evidence["chainOfCustody"].as_array().unwrap();
    assert_eq!(custody.len(), 1);
    assert_eq!(custody[0]["action"], "COLLECTED");
    assert_eq!(custody[0]["notes"], "Evidence collected and uploaded");
    assert_eq!(custody[0]["performedBy"]["id"], user_id.as_str());

    create_timeline_event(&base, &client, &token, &case_id, "high", "Suspicious login").await;
    create_timeline_event(&base, &client, &token, &case_id, "low", "Routine scan").await;

    let detail: Value = client
        .get(format!("{}/api/cases/{}", base, case_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["evidenceCount"], 1);
    assert_eq!(detail["eventsCount"], 2);
    assert_eq!(detail["suspiciousActivities"], 1);
    assert_eq!(detail["evidence"].as_array().unwrap().len(), 1);
    assert_eq!(detail["timelineEvents"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_enum_values_are_rejected_with_the_valid_set() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "enum@forensics.io").await;

    let response = client
        .post(format!("{}/api/cases", base))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Enum check",
            "description": "Description long enough for validation.",
            "severity": "urgent",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(
        errors[0]["message"],
        "Invalid severity: urgent. Valid values are: LOW, MEDIUM, HIGH, CRITICAL"
    );
}

#[tokio::test]
async fn create_validates_title_description_and_tags() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "valid@forensics.io").await;

    let response = client
        .post(format!("{}/api/cases", base))
        .bearer_auth(&token)
        .json(&json!({
            "title": "ab",
            "description": "too short",
            "severity": "low",
            "tags": (0..21).map(|i| format!("t{}", i)).collect::<Vec<_>>(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    let messages: Vec<&str> =
        body["errors"].as_array().unwrap().iter().map(|e| e["message"].as_str().unwrap()).collect();
    assert!(messages.contains(&"Title must be at least 3 characters"));
    assert!(messages.contains(&"Description must be at least 10 characters"));
    assert!(messages.contains(&"Maximum 20 tags allowed"));
}

#[tokio::test]
async fn tags_and_location_round_trip() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "geo@forensics.io").await;

    let response = client
        .post(format!("{}/api/cases", base))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Tagged case",
            "description": "A case carrying tags and a location.",
            "severity": "medium",
            "tags": [" aws ", "s3", "pii"],
            "location": {"city": "Berlin", "country": "Germany", "lat": 52.52, "lng": 13.405},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["tags"], json!(["aws", "s3", "pii"]));
    assert_eq!(body["locationCity"], "Berlin");
    assert_eq!(body["locationLat"], 52.52);
}

#[tokio::test]
async fn list_filters_by_status_and_severity() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "filter@forensics.io").await;

    create_case(&base, &client, &token, "Critical one", "critical").await;
    create_case(&base, &client, &token, "Low one", "low").await;

    let all: Value = client
        .get(format!("{}/api/cases", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let critical: Value = client
        .get(format!("{}/api/cases?severity=critical", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let critical = critical.as_array().unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0]["title"], "Critical one");

    let closed: Value = client
        .get(format!("{}/api/cases?status=closed", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(closed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn update_changes_fields_and_can_clear_the_assignee() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, user_id) = register_user(&base, &client, "owner@forensics.io").await;

    let case = create_case(&base, &client, &token, "Reassignment", "high").await;
    let case_id = case["id"].as_str().unwrap();

    let assigned: Value = client
        .put(format!("{}/api/cases/{}", base, case_id))
        .bearer_auth(&token)
        .json(&json!({"assignedToId": user_id}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(assigned["assignedTo"]["id"], user_id.as_str());

    let cleared: Value = client
        .put(format!("{}/api/cases/{}", base, case_id))
        .bearer_auth(&token)
        .json(&json!({"status": "closed", "assignedToId": null}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["status"], "CLOSED");
    assert_eq!(cleared["assignedTo"], Value::Null);
}

#[tokio::test]
async fn update_with_no_fields_is_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "empty@forensics.io").await;

    let case = create_case(&base, &client, &token, "Untouched", "low").await;
    let response = client
        .put(format!("{}/api/cases/{}", base, case["id"].as_str().unwrap()))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "At least one field must be provided for update");
}

#[tokio::test]
async fn assigning_an_unknown_user_fails_with_404() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "assign@forensics.io").await;

    let ghost = "11111111-2222-3333-4444-555555555555";
    let response = client
        .post(format!("{}/api/cases", base))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Ghost assignee",
            "description": "Assignment target does not exist.",
            "severity": "low",
            "assignedToId": ghost,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], format!("User with ID {} not found", ghost));
}

#[tokio::test]
async fn missing_case_yields_the_documented_message() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "missing@forensics.io").await;

    let id = "99999999-9999-9999-9999-999999999999";
    let response = client
        .get(format!("{}/api/cases/{}", base, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], format!("Case with ID {} not found", id));
}

#[tokio::test]
async fn deleting_a_case_removes_its_children() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "cascade@forensics.io").await;

    let case = create_case(&base, &client, &token, "Cascade case", "high").await;
    let case_id = case["id"].as_str().unwrap().to_string();
    let evidence = create_evidence(&base, &client, &token, &case_id, "dump.bin").await;
    let event =
        create_timeline_event(&base, &client, &token, &case_id, "medium", "Odd traffic").await;

    let deleted = client
        .delete(format!("{}/api/cases/{}", base, case_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let gone_evidence = client
        .get(format!("{}/api/evidence/{}", base, evidence["id"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone_evidence.status(), 404);

    let gone_event = client
        .get(format!("{}/api/timeline/{}", base, event["id"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone_event.status(), 404);

    let gone_case = client
        .get(format!("{}/api/cases/{}", base, case_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone_case.status(), 404);
}

#[tokio::test]
async fn evidence_listing_scopes_to_a_case_and_orders_custody() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "chain@forensics.io").await;

    let case_a = create_case(&base, &client, &token, "Case A", "low").await;
    let case_b = create_case(&base, &client, &token, "Case B", "low").await;
    let a_id = case_a["id"].as_str().unwrap().to_string();
    let b_id = case_b["id"].as_str().unwrap().to_string();

    create_evidence(&base, &client, &token, &a_id, "a1.log").await;
    create_evidence(&base, &client, &token, &a_id, "a2.log").await;
    create_evidence(&base, &client, &token, &b_id, "b1.log").await;

    let scoped: Value = client
        .get(format!("{}/api/evidence?caseId={}", base, a_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let scoped = scoped.as_array().unwrap();
    assert_eq!(scoped.len(), 2);
    for item in scoped {
        assert_eq!(item["caseId"], a_id.as_str());
        let custody = item["chainOfCustody"].as_array().unwrap();
        assert_eq!(custody[0]["action"], "COLLECTED");
    }

    let all: Value = client
        .get(format!("{}/api/evidence", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn timeline_filters_by_severity() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "timeline@forensics.io").await;

    let case = create_case(&base, &client, &token, "Timeline case", "medium").await;
    let case_id = case["id"].as_str().unwrap().to_string();
    create_timeline_event(&base, &client, &token, &case_id, "critical", "Exfiltration").await;
    create_timeline_event(&base, &client, &token, &case_id, "low", "Heartbeat").await;

    let critical: Value = client
        .get(format!("{}/api/timeline?caseId={}&severity=critical", base, case_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let critical = critical.as_array().unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0]["title"], "Exfiltration");
}

#[tokio::test]
async fn timeline_rejects_a_malformed_timestamp() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_user(&base, &client, "ts@forensics.io").await;

    let case = create_case(&base, &client, &token, "Timestamp case", "low").await;
    let response = client
        .post(format!("{}/api/timeline", base))
        .bearer_auth(&token)
        .json(&json!({
            "timestamp": "yesterday at noon",
            "type": "alert",
            "source": "IDS",
            "severity": "low",
            "title": "Bad clock",
            "description": "Unparseable timestamp.",
            "caseId": case["id"].as_str().unwrap(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
