//! Populates an empty database with a demo organisation and a few weeks of
//! clock events. Run once against a development database:
//! `cargo run --bin seed_demo -- 30`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use attendance_backend::{
    config::Config,
    db::connection::create_pool,
    models::{
        department::{CreateDepartmentRequest, CreateSubDepartmentRequest},
        employee::CreateEmployeeRequest,
        user::{User, UserRole},
    },
    repositories::{begin_transaction, commit_transaction, UserRepository},
    services::ClientInfo,
    state::AppState,
    types::{DepartmentId, SubDepartmentId, UserId},
    utils::{credentials::hash_password, time::days_in_range},
};

const ADMIN_EMAIL: &str = "admin@example.com";
const DEMO_PASSWORD: &str = "password123";
const DEFAULT_DAYS: i64 = 30;

const ORGANISATION: [(&str, [&str; 2]); 2] = [
    ("Engineering", ["Backend", "Frontend"]),
    ("Operations", ["Support", "Logistics"]),
];

const EMPLOYEES: [(&str, &str, usize); 8] = [
    ("Ada Lovelace", "Software Engineer", 0),
    ("Alan Turing", "Software Engineer", 0),
    ("Grace Hopper", "Frontend Engineer", 1),
    ("Linus Pauling", "Frontend Engineer", 1),
    ("Mary Jackson", "Support Specialist", 2),
    ("Katherine Johnson", "Support Specialist", 2),
    ("Edsger Dijkstra", "Logistics Coordinator", 3),
    ("Barbara Liskov", "Logistics Coordinator", 3),
];

fn employee_request(
    code: String,
    name: &str,
    designation: &str,
    role: UserRole,
    placement: (DepartmentId, SubDepartmentId),
) -> CreateEmployeeRequest {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    CreateEmployeeRequest {
        employee_code: code,
        name: name.to_string(),
        email,
        password: DEMO_PASSWORD.to_string(),
        role,
        department_id: Some(placement.0),
        sub_department_id: Some(placement.1),
        designation: designation.to_string(),
        weekend_days: vec!["saturday".to_string(), "sunday".to_string()],
        phone: None,
        joining_date: None,
        nationality: None,
        present_address: None,
        permanent_address: None,
        managed_sub_department_ids: None,
    }
}

async fn bootstrap_admin(state: &AppState) -> anyhow::Result<User> {
    let now = Utc::now();
    let admin = User {
        id: UserId::new(),
        employee_code: "ADM-001".to_string(),
        name: "Demo Admin".to_string(),
        email: ADMIN_EMAIL.to_string(),
        password_hash: hash_password(DEMO_PASSWORD)?,
        role: UserRole::Admin,
        department_id: None,
        sub_department_id: None,
        designation: "Administrator".to_string(),
        weekend_days: vec!["saturday".to_string(), "sunday".to_string()],
        phone: None,
        joining_date: Some(now.date_naive()),
        nationality: None,
        present_address: None,
        permanent_address: None,
        created_at: now,
        updated_at: now,
    };

    let mut tx = begin_transaction(&state.pool).await?;
    let admin = UserRepository::new().insert_in_transaction(&mut tx, &admin).await?;
    commit_transaction(tx).await?;
    Ok(admin)
}

fn at(date: NaiveDate, base: chrono::NaiveTime, offset_minutes: i64) -> NaiveDateTime {
    date.and_time(base) + Duration::minutes(offset_minutes)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed_demo=info,attendance_backend=info".into()),
        )
        .init();

    let days: i64 = std::env::args()
        .nth(1)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_DAYS);

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let state = AppState::new(pool, config);

    if state.users.find_by_login(&state.pool, ADMIN_EMAIL).await?.is_some() {
        tracing::info!("demo data already present; nothing to do");
        return Ok(());
    }

    let admin = bootstrap_admin(&state).await?;

    let mut placements = Vec::new();
    for (department_name, sub_names) in ORGANISATION {
        let department = state
            .directory
            .create_department(
                &admin,
                CreateDepartmentRequest {
                    name: department_name.to_string(),
                    description: None,
                },
            )
            .await?;
        for sub_name in sub_names {
            let sub = state
                .directory
                .create_sub_department(
                    &admin,
                    department.id,
                    CreateSubDepartmentRequest {
                        name: sub_name.to_string(),
                        description: None,
                    },
                )
                .await?;
            placements.push((department.id, sub.id));
        }
    }

    // One manager per department, scoped to its sub-departments.
    for (index, (department_name, _)) in ORGANISATION.iter().enumerate() {
        let placement = placements[index * 2];
        let mut request = employee_request(
            format!("MGR-{:03}", index + 1),
            &format!("{} Manager", department_name),
            "Manager",
            UserRole::Manager,
            placement,
        );
        request.managed_sub_department_ids = Some(vec![placements[index * 2].1, placements[index * 2 + 1].1]);
        state.directory.create_employee(&admin, request).await?;
    }

    let mut staff = Vec::new();
    for (index, (name, designation, slot)) in EMPLOYEES.iter().enumerate() {
        let created = state
            .directory
            .create_employee(
                &admin,
                employee_request(
                    format!("EMP-{:03}", index + 1),
                    name,
                    designation,
                    UserRole::User,
                    placements[*slot],
                ),
            )
            .await?;
        if let Some(user) = state.users.find_by_id(&state.pool, created.profile.id).await? {
            staff.push(user);
        }
    }

    let mut rng = StdRng::seed_from_u64(7);
    let policy = state.attendance.policy().clone();
    let today = state.today();
    let first = today - Duration::days(days.max(1));
    let mut recorded = 0usize;

    for day in days_in_range(first, today - Duration::days(1)) {
        for user in &staff {
            if user.is_weekend(day.weekday()) || rng.gen_bool(0.08) {
                continue;
            }
            let client = ClientInfo {
                ip: Some(format!("10.0.0.{}", rng.gen_range(2..250))),
                user_agent: Some("seed_demo".to_string()),
            };
            let clock_in = at(day, policy.office_start, rng.gen_range(-25..=40));
            let clock_out = at(day, policy.office_end, rng.gen_range(-45..=75));
            state.attendance.clock_in(user, clock_in, client.clone()).await?;
            state.attendance.clock_out(user, clock_out, client).await?;
            recorded += 1;
        }
    }

    tracing::info!(
        employees = staff.len(),
        records = recorded,
        from = %first,
        "demo data created; log in as {} / {}",
        ADMIN_EMAIL,
        DEMO_PASSWORD
    );
    Ok(())
}
