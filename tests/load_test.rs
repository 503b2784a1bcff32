//! Concurrent load through the gateway.

use std::collections::HashMap;
use std::time::Instant;

mod common;
use common::*;

#[tokio::test]
async fn test_concurrent_load_is_spread_evenly() {
    let instances = 3;
    let mut urls = Vec::new();
    for i in 0..instances {
        let addr = start_programmable_backend(move || async move { (200, format!("instance-{}", i)) }).await;
        urls.push(http_url(addr));
    }

    let gateway = spawn_gateway(|_| {}).await;
    for url in &urls {
        gateway.state.registry.register("itemService", url).await.unwrap();
    }

    let concurrency = 20;
    let requests_per_task = 30;
    let total_requests = concurrency * requests_per_task;

    let client = client();
    let target = gateway.url("/api/itemService/items");
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let target = target.clone();
        tasks.push(tokio::spawn(async move {
            let mut results = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                if let Ok(res) = client.get(&target).send().await {
                    if res.status().is_success() {
                        let body = res.text().await.unwrap_or_default();
                        results.push((body, req_start.elapsed()));
                    }
                }
            }
            results
        }));
    }

    let mut per_instance: HashMap<String, usize> = HashMap::new();
    let mut latencies = Vec::new();
    for task in tasks {
        for (body, latency) in task.await.unwrap() {
            *per_instance.entry(body).or_default() += 1;
            latencies.push(latency);
        }
    }

    let duration = start.elapsed();
    assert_eq!(latencies.len(), total_requests, "some requests failed");

    // Rotation is serialized, so every instance gets exactly its share
    assert_eq!(per_instance.len(), instances);
    for count in per_instance.values() {
        assert_eq!(*count, total_requests / instances);
    }

    latencies.sort();
    let p50 = latencies[latencies.len() / 2];
    let p99 = latencies[(latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("Distribution:   {:?}", per_instance);
    println!("-------------------------\n");
}
