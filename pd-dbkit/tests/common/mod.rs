//! Shared fixtures for pd-dbkit integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use pd_dbkit::{connect_to_prodev, create_user_data_table, insert_user_data_from_csv, setup_demo_users};

/// Rows in the shape of the shipped `user_data.csv` seed.
pub const SEED_CSV: &str = "\
user_id,name,email,age
00234e50-34eb-4ce2-94ec-26e3fa749796,Dan Altenwerth Jr.,Molly59@gmail.com,67
006bfede-724d-4cdd-a2a6-59700f40d0da,Glenda Wisozk,Miriam21@gmail.com,119
006e1f7f-90c2-45ad-8c1d-1275d594cc88,Daniel Fahey IV,Delia.Lesch11@hotmail.com,49
00af05c9-0a86-419e-8c2d-5fb7e899ae1c,Ronnie Bechtelar,Sandra19@yahoo.com,22
00cc08cc-62f4-4da1-b8e4-f5d9ef5dbbd4,Alma Bechtelar,Shelly_Balistreri22@hotmail.com,102
01187f09-72be-4924-8a2d-150645dcadad,Jonathon Jones,Jody.Quigley-Ziemann33@yahoo.com,116
";

/// A temporary directory holding both demo databases.
pub struct TestDb {
    pub dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn users_db(&self) -> PathBuf {
        self.dir.path().join("users.db")
    }

    pub fn user_data_db(&self) -> PathBuf {
        self.dir.path().join("user_data.db")
    }

    /// `users.db` with Alice and Bob.
    pub fn with_demo_users(self) -> Self {
        let conn = connect_to_prodev(self.users_db()).expect("open users.db");
        setup_demo_users(&conn).expect("seed users");
        self
    }

    /// `user_data.db` seeded from `csv`.
    pub fn with_user_data(self, csv: &str) -> Self {
        let csv_path = self.write_csv("user_data.csv", csv);
        let mut conn = connect_to_prodev(self.user_data_db()).expect("open user_data.db");
        create_user_data_table(&conn).expect("create table");
        insert_user_data_from_csv(&mut conn, &csv_path).expect("seed user_data");
        self
    }

    pub fn write_csv(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create csv");
        file.write_all(contents.as_bytes()).expect("write csv");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
