// src/register_tests.rs

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::feedback::Severity;
    use crate::grid::{GridState, UNTITLED_TASK};
    use crate::register::{build_save_plan, OpPhase, WeekRegister};
    use crate::sources::{
        CreatedEntry, HolidayEntry, HolidaySource, LeaveDayEntry, LeaveSource, NewTimesheetEntry,
        SourceError, TimesheetEntry, TimesheetStore,
    };
    use crate::week::WeekWindow;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    /// In-memory stand-in for the backend. Records every call so tests can
    /// assert exactly which network traffic an operation produced, and can
    /// be scripted to fail per endpoint.
    #[derive(Default)]
    struct MockBackend {
        holidays: Mutex<Vec<HolidayEntry>>,
        leaves: Mutex<Vec<LeaveDayEntry>>,
        entries: Mutex<Vec<TimesheetEntry>>,
        calls: Mutex<Vec<String>>,
        fail_holidays: AtomicBool,
        fail_list: AtomicBool,
        fail_deletes: AtomicBool,
        fail_update_ids: Mutex<HashSet<String>>,
        next_id: Mutex<u64>,
    }

    impl MockBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// Calls that would have changed backend state.
        fn mutation_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| {
                    ["create", "update", "delete", "submit"]
                        .iter()
                        .any(|prefix| call.starts_with(prefix))
                })
                .count()
        }

        fn seed_entry(&self, id: &str, date: &str, hours: Decimal, task: Option<&str>, status: &str) {
            self.entries.lock().unwrap().push(TimesheetEntry {
                timesheet_id: id.to_string(),
                work_date: d(date),
                worked_hours: hours,
                task_name: task.map(String::from),
                status: status.to_string(),
                client_id: None,
                task_description: None,
            });
        }

        fn add_holiday(&self, date: &str, name: &str, active: bool) {
            self.holidays.lock().unwrap().push(HolidayEntry {
                date: d(date),
                name: name.to_string(),
                active,
            });
        }

        fn add_leave(&self, date: &str, category: &str, duration: Decimal) {
            self.leaves.lock().unwrap().push(LeaveDayEntry {
                date: d(date),
                leave_category: category.to_string(),
                duration,
            });
        }

        fn entry(&self, id: &str) -> Option<TimesheetEntry> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .find(|entry| entry.timesheet_id == id)
                .cloned()
        }

        fn fail_updates_for(&self, id: &str) {
            self.fail_update_ids.lock().unwrap().insert(id.to_string());
        }

        fn clear_update_failures(&self) {
            self.fail_update_ids.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl HolidaySource for MockBackend {
        async fn list_active_holidays(&self) -> Result<Vec<HolidayEntry>, SourceError> {
            self.record("holidays".to_string());
            if self.fail_holidays.load(Ordering::SeqCst) {
                return Err(SourceError::Transport("holiday service down".to_string()));
            }
            Ok(self.holidays.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl LeaveSource for MockBackend {
        async fn list_approved_leaves(&self, _year: i32) -> Result<Vec<LeaveDayEntry>, SourceError> {
            self.record("leaves".to_string());
            Ok(self.leaves.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl TimesheetStore for MockBackend {
        async fn list(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<TimesheetEntry>, SourceError> {
            self.record("list".to_string());
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(SourceError::Transport("timesheet service down".to_string()));
            }
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|entry| entry.work_date >= start && entry.work_date <= end)
                .cloned()
                .collect())
        }

        async fn create_batch(
            &self,
            new_entries: &[NewTimesheetEntry],
        ) -> Result<Vec<CreatedEntry>, SourceError> {
            self.record(format!("create:{}", new_entries.len()));
            let mut created = Vec::new();
            for entry in new_entries {
                let id = {
                    let mut next = self.next_id.lock().unwrap();
                    *next += 1;
                    format!("GEN{}", next)
                };
                self.entries.lock().unwrap().push(TimesheetEntry {
                    timesheet_id: id.clone(),
                    work_date: entry.work_date,
                    worked_hours: entry.hours_worked,
                    task_name: Some(entry.task_name.clone()),
                    status: "Draft".to_string(),
                    client_id: None,
                    task_description: Some(entry.task_description.clone()),
                });
                created.push(CreatedEntry {
                    timesheet_id: id,
                    work_date: entry.work_date,
                    task_name: Some(entry.task_name.clone()),
                });
            }
            Ok(created)
        }

        async fn update(
            &self,
            timesheet_id: &str,
            entry: &NewTimesheetEntry,
        ) -> Result<(), SourceError> {
            self.record(format!("update:{}", timesheet_id));
            if self
                .fail_update_ids
                .lock()
                .unwrap()
                .contains(timesheet_id)
            {
                return Err(SourceError::Rejected("update refused".to_string()));
            }
            let mut entries = self.entries.lock().unwrap();
            match entries
                .iter_mut()
                .find(|existing| existing.timesheet_id == timesheet_id)
            {
                Some(existing) => {
                    existing.worked_hours = entry.hours_worked;
                    existing.task_name = Some(entry.task_name.clone());
                    Ok(())
                }
                None => Err(SourceError::Rejected("unknown identifier".to_string())),
            }
        }

        async fn delete(&self, timesheet_id: &str) -> Result<(), SourceError> {
            self.record(format!("delete:{}", timesheet_id));
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(SourceError::Transport("delete refused".to_string()));
            }
            self.entries
                .lock()
                .unwrap()
                .retain(|entry| entry.timesheet_id != timesheet_id);
            Ok(())
        }

        async fn submit_for_approval(&self, timesheet_ids: &[String]) -> Result<(), SourceError> {
            self.record(format!("submit:{}", timesheet_ids.len()));
            let mut entries = self.entries.lock().unwrap();
            for entry in entries.iter_mut() {
                if timesheet_ids.contains(&entry.timesheet_id) {
                    entry.status = "Submitted".to_string();
                }
            }
            Ok(())
        }
    }

    async fn loaded_register(backend: &Arc<MockBackend>, anchor: &str) -> WeekRegister {
        let week = WeekWindow::containing(d(anchor));
        let mut register = WeekRegister::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            week,
        )
        .with_settle_delay(Duration::ZERO);
        register.load_week(week).await;
        register
    }

    fn feedback_texts(register: &mut WeekRegister) -> Vec<String> {
        register
            .feedback
            .drain()
            .into_iter()
            .map(|message| message.text)
            .collect()
    }

    #[tokio::test]
    async fn load_groups_remote_entries_into_rows() {
        let backend = MockBackend::new();
        backend.seed_entry("TS1", "2024-06-03", dec!(4), Some("Dev"), "Draft");
        backend.seed_entry("TS2", "2024-06-04", dec!(2), Some("Dev"), "Draft");
        backend.seed_entry("TS3", "2024-06-03", dec!(3), Some("QA"), "Draft");
        backend.seed_entry("TS4", "2024-06-05", dec!(1), None, "Draft");

        let register = loaded_register(&backend, "2024-06-03").await;

        assert_eq!(register.grid.rows.len(), 3);
        assert!(!register.is_locked());
        assert_eq!(register.phase(), OpPhase::Idle);

        let dev = &register.grid.rows[register.find_row("Dev").unwrap()];
        assert_eq!(dev.hours_on(d("2024-06-03")), dec!(4));
        assert_eq!(dev.remote_ids.get(&d("2024-06-04")).unwrap(), "TS2");
        assert!(register.find_row(UNTITLED_TASK).is_some());
    }

    #[tokio::test]
    async fn load_synthesizes_one_blank_row_for_an_empty_week() {
        let backend = MockBackend::new();
        let register = loaded_register(&backend, "2024-06-03").await;

        assert_eq!(register.grid.rows.len(), 1);
        let row = &register.grid.rows[0];
        assert!(row.task_name.is_empty());
        assert!(row.remote_ids.is_empty());
        assert!(!row.is_dirty());
        assert!(row.hours.values().all(|hours| *hours == Decimal::ZERO));
    }

    #[tokio::test]
    async fn load_filters_entries_from_a_neighboring_month() {
        let backend = MockBackend::new();
        // Week of Mon 2024-04-29 crosses into May.
        backend.seed_entry("TS1", "2024-04-30", dec!(8), Some("Dev"), "Draft");
        backend.seed_entry("TS2", "2024-05-01", dec!(8), Some("Dev"), "Draft");

        let register = loaded_register(&backend, "2024-04-29").await;

        let dev = &register.grid.rows[register.find_row("Dev").unwrap()];
        assert_eq!(dev.hours_on(d("2024-04-30")), dec!(8));
        assert!(
            dev.remote_ids.get(&d("2024-05-01")).is_none(),
            "entries outside the start month must be dropped"
        );
    }

    #[tokio::test]
    async fn holiday_failure_degrades_to_an_empty_calendar() {
        let backend = MockBackend::new();
        backend.add_holiday("2024-06-05", "Midsummer", true);
        backend.fail_holidays.store(true, Ordering::SeqCst);
        backend.seed_entry("TS1", "2024-06-03", dec!(8), Some("Dev"), "Draft");

        let mut register = loaded_register(&backend, "2024-06-03").await;

        assert!(register.grid.holiday_map.is_empty());
        assert_eq!(register.grid.rows.len(), 1, "entries still load");
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("holiday calendar unavailable")));
    }

    #[tokio::test]
    async fn inactive_holidays_stay_out_of_the_working_set() {
        let backend = MockBackend::new();
        backend.add_holiday("2024-06-05", "Midsummer", true);
        backend.add_holiday("2024-06-06", "Repealed Day", false);

        let register = loaded_register(&backend, "2024-06-03").await;

        assert_eq!(register.grid.holiday_name(d("2024-06-05")), Some("Midsummer"));
        assert_eq!(register.grid.holiday_name(d("2024-06-06")), None);
    }

    #[tokio::test]
    async fn timesheet_failure_leaves_an_unlocked_empty_grid() {
        let backend = MockBackend::new();
        backend.fail_list.store(true, Ordering::SeqCst);

        let mut register = loaded_register(&backend, "2024-06-03").await;

        assert!(register.grid.rows.is_empty());
        assert!(!register.is_locked());
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("failed to load timesheet entries")));
    }

    #[tokio::test]
    async fn a_submitted_entry_locks_every_mutation_out() {
        let backend = MockBackend::new();
        backend.seed_entry("TS1", "2024-06-03", dec!(8), Some("Dev"), "Submitted");

        let mut register = loaded_register(&backend, "2024-06-03").await;
        assert!(register.is_locked());

        let mutations_before = backend.mutation_count();
        register.edit_cell(0, d("2024-06-04"), dec!(4));
        register.save_all().await;
        assert!(!register.begin_submit());
        register.delete_row(0).await;

        assert_eq!(
            backend.mutation_count(),
            mutations_before,
            "a locked week must not produce network traffic"
        );
        assert_eq!(register.grid.rows.len(), 1);
        assert_eq!(register.grid.rows[0].hours_on(d("2024-06-04")), Decimal::ZERO);

        let texts = feedback_texts(&mut register);
        assert!(texts.iter().any(|text| text.contains("already submitted")));
    }

    #[tokio::test]
    async fn cell_edits_surface_cap_warnings() {
        let backend = MockBackend::new();
        backend.add_holiday("2024-06-05", "Independence Day", true);
        backend.add_leave("2024-06-07", "Annual Leave", dec!(0.5));

        let mut register = loaded_register(&backend, "2024-06-03").await;
        register.rename_task(0, "Dev");

        register.edit_cell(0, d("2024-06-05"), dec!(5));
        assert_eq!(register.grid.rows[0].hours_on(d("2024-06-05")), Decimal::ZERO);

        register.edit_cell(0, d("2024-06-07"), dec!(6));
        assert_eq!(register.grid.rows[0].hours_on(d("2024-06-07")), dec!(4));

        let texts = feedback_texts(&mut register);
        assert!(texts.iter().any(|text| text.contains("Independence Day")));
        assert!(texts
            .iter()
            .any(|text| text.contains("only 4h available")));
    }

    #[test]
    fn save_routes_creates_and_updates_by_identifier() {
        let week = WeekWindow::containing(d("2024-06-03"));
        let mut grid = GridState::new(week);

        let dev = grid.add_blank_row();
        grid.rows[dev].task_name = "Dev".to_string();
        grid.rows[dev]
            .remote_ids
            .insert(d("2024-06-03"), "TS1".to_string());
        grid.rows[dev].dirty_cells.insert(d("2024-06-03"));
        grid.rows[dev].hours.insert(d("2024-06-03"), dec!(6));
        grid.rows[dev].dirty_cells.insert(d("2024-06-04"));
        grid.rows[dev].hours.insert(d("2024-06-04"), dec!(2));

        let qa = grid.add_blank_row();
        grid.rows[qa].task_name = "QA".to_string();
        grid.rows[qa]
            .remote_ids
            .insert(d("2024-06-03"), "TS2".to_string());
        grid.rows[qa].hours.insert(d("2024-06-03"), dec!(3));

        let plan = build_save_plan(&grid);

        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].timesheet_id, "TS1");
        assert_eq!(plan.updates[0].entry.hours_worked, dec!(6));

        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].entry.work_date, d("2024-06-04"));
        assert_eq!(plan.creates[0].entry.hours_worked, dec!(2));

        // The clean QA row contributes nothing despite its remote id.
        assert!(plan
            .updates
            .iter()
            .all(|update| update.timesheet_id != "TS2"));
    }

    #[test]
    fn a_name_edit_routes_every_saved_cell_to_the_update_queue() {
        let week = WeekWindow::containing(d("2024-06-03"));
        let mut grid = GridState::new(week);
        let dev = grid.add_blank_row();
        grid.rows[dev].task_name = "Dev (billable)".to_string();
        grid.rows[dev].name_dirty = true;
        for (date, id) in [("2024-06-03", "TS1"), ("2024-06-04", "TS2")] {
            grid.rows[dev].remote_ids.insert(d(date), id.to_string());
            grid.rows[dev].hours.insert(d(date), dec!(8));
        }

        let plan = build_save_plan(&grid);
        assert!(plan.creates.is_empty());
        assert_eq!(plan.updates.len(), 2);
    }

    #[tokio::test]
    async fn saving_twice_issues_no_second_round_of_calls() {
        let backend = MockBackend::new();
        let mut register = loaded_register(&backend, "2024-06-03").await;

        register.rename_task(0, "Dev");
        register.edit_cell(0, d("2024-06-03"), dec!(8));
        assert!(register.save_all().await);

        let mutations_after_first = backend.mutation_count();
        assert_eq!(mutations_after_first, 1, "exactly one batched create");

        feedback_texts(&mut register);
        assert!(register.save_all().await);

        assert_eq!(backend.mutation_count(), mutations_after_first);
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("nothing to save")));
    }

    #[tokio::test]
    async fn saving_reconciles_created_identifiers_into_the_grid() {
        let backend = MockBackend::new();
        let mut register = loaded_register(&backend, "2024-06-03").await;

        register.rename_task(0, "Dev");
        register.edit_cell(0, d("2024-06-03"), dec!(8));
        register.edit_cell(0, d("2024-06-04"), dec!(6));
        assert!(register.save_all().await);

        let dev = &register.grid.rows[register.find_row("Dev").unwrap()];
        assert_eq!(dev.remote_ids.len(), 2);
        assert!(!dev.is_dirty());
        assert_eq!(backend.entries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn a_failed_update_keeps_the_cell_dirty_for_the_next_save() {
        let backend = MockBackend::new();
        backend.seed_entry("TS1", "2024-06-03", dec!(4), Some("Dev"), "Draft");
        backend.fail_updates_for("TS1");

        let mut register = loaded_register(&backend, "2024-06-03").await;
        register.edit_cell(0, d("2024-06-03"), dec!(6));
        register.edit_cell(0, d("2024-06-04"), dec!(2));
        assert!(register.save_all().await);

        // The create went through, the update did not; the grid keeps the
        // user's value and the cell stays pending.
        let dev = &register.grid.rows[register.find_row("Dev").unwrap()];
        assert_eq!(dev.hours_on(d("2024-06-03")), dec!(6));
        assert!(dev.dirty_cells.contains(&d("2024-06-03")));
        assert!(!dev.dirty_cells.contains(&d("2024-06-04")));
        assert_eq!(backend.entry("TS1").unwrap().worked_hours, dec!(4));
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("could not be updated")));

        // Once the backend recovers, the pending cell saves cleanly.
        backend.clear_update_failures();
        assert!(register.save_all().await);
        assert_eq!(backend.entry("TS1").unwrap().worked_hours, dec!(6));
    }

    #[tokio::test]
    async fn submit_walks_through_confirmation_and_locks_the_week() {
        let backend = MockBackend::new();
        backend.add_holiday("2024-06-05", "Independence Day", true);

        let mut register = loaded_register(&backend, "2024-06-03").await;
        register.rename_task(0, "Dev");
        for date in ["2024-06-03", "2024-06-04", "2024-06-06", "2024-06-07"] {
            register.edit_cell(0, d(date), dec!(8));
        }

        assert!(register.begin_submit());
        assert_eq!(register.phase(), OpPhase::Confirming);
        register.confirm_submit().await;

        assert!(register.is_locked());
        assert!(backend
            .entries
            .lock()
            .unwrap()
            .iter()
            .all(|entry| entry.status == "Submitted"));
        assert!(backend
            .calls()
            .iter()
            .any(|call| call == "submit:4"));

        let texts = feedback_texts(&mut register);
        assert!(texts
            .iter()
            .any(|text| text.contains("submitted for approval")));
    }

    #[tokio::test]
    async fn cancelling_the_confirmation_returns_to_idle() {
        let backend = MockBackend::new();
        backend.add_holiday("2024-06-05", "Independence Day", true);

        let mut register = loaded_register(&backend, "2024-06-03").await;
        register.rename_task(0, "Dev");
        for date in ["2024-06-03", "2024-06-04", "2024-06-06", "2024-06-07"] {
            register.edit_cell(0, d(date), dec!(8));
        }

        assert!(register.begin_submit());
        register.cancel_submit();
        assert_eq!(register.phase(), OpPhase::Idle);
        assert!(!register.is_locked());
        assert!(backend.calls().iter().all(|call| !call.starts_with("submit")));
    }

    #[tokio::test]
    async fn confirmation_revalidates_a_grid_edited_while_pending() {
        let backend = MockBackend::new();
        backend.add_holiday("2024-06-05", "Independence Day", true);

        let mut register = loaded_register(&backend, "2024-06-03").await;
        register.rename_task(0, "Dev");
        for date in ["2024-06-03", "2024-06-04", "2024-06-06", "2024-06-07"] {
            register.edit_cell(0, d(date), dec!(8));
        }

        assert!(register.begin_submit());
        // The grid stays editable while the confirmation is pending; the
        // user clears Friday before confirming.
        register.edit_cell(0, d("2024-06-07"), Decimal::ZERO);
        register.confirm_submit().await;

        assert!(!register.is_locked());
        assert!(backend.calls().iter().all(|call| !call.starts_with("submit")));
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("2024-06-07") && text.contains("no hours entered")));
    }

    #[tokio::test]
    async fn submit_refuses_an_invalid_week_up_front() {
        let backend = MockBackend::new();
        let mut register = loaded_register(&backend, "2024-06-03").await;
        register.rename_task(0, "Dev");
        register.edit_cell(0, d("2024-06-03"), dec!(8));

        assert!(!register.begin_submit());
        assert_eq!(register.phase(), OpPhase::Idle);
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("no hours entered")));
    }

    #[tokio::test]
    async fn submit_aborts_when_no_entry_carries_hours() {
        let backend = MockBackend::new();
        // Every weekday is covered, so validation passes on an empty grid.
        for date in [
            "2024-06-03",
            "2024-06-04",
            "2024-06-05",
            "2024-06-06",
            "2024-06-07",
        ] {
            backend.add_holiday(date, "Shutdown Week", true);
        }

        let mut register = loaded_register(&backend, "2024-06-03").await;
        assert!(register.begin_submit());
        register.confirm_submit().await;

        assert!(!register.is_locked());
        assert!(backend.calls().iter().all(|call| !call.starts_with("submit")));
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("no valid entries to submit")));
    }

    #[tokio::test]
    async fn deleting_a_saved_row_cascades_to_the_backend() {
        let backend = MockBackend::new();
        backend.seed_entry("TS1", "2024-06-03", dec!(4), Some("Dev"), "Draft");
        backend.seed_entry("TS2", "2024-06-04", dec!(4), Some("Dev"), "Draft");

        let mut register = loaded_register(&backend, "2024-06-03").await;
        let row_idx = register.find_row("Dev").unwrap();
        register.delete_row(row_idx).await;

        assert!(backend.entries.lock().unwrap().is_empty());
        let calls = backend.calls();
        assert!(calls.contains(&"delete:TS1".to_string()));
        assert!(calls.contains(&"delete:TS2".to_string()));
        // The reload after the cascade regroups from the now-empty backend.
        assert_eq!(register.grid.rows.len(), 1);
        assert!(register.grid.rows[0].task_name.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_local_row_skips_the_reload() {
        let backend = MockBackend::new();
        let mut register = loaded_register(&backend, "2024-06-03").await;

        register.rename_task(0, "Keep Me");
        register.edit_cell(0, d("2024-06-03"), dec!(3));
        let scratch = register.add_row().unwrap();
        register.rename_task(scratch, "Scratch");

        let lists_before = backend
            .calls()
            .iter()
            .filter(|call| *call == "list")
            .count();
        register.delete_row(scratch).await;

        let lists_after = backend
            .calls()
            .iter()
            .filter(|call| *call == "list")
            .count();
        assert_eq!(lists_before, lists_after, "no reload for a local-only row");
        assert_eq!(backend.mutation_count(), 0);

        // The unsaved neighbor survives untouched.
        let keep = &register.grid.rows[register.find_row("Keep Me").unwrap()];
        assert_eq!(keep.hours_on(d("2024-06-03")), dec!(3));
        assert!(keep.is_dirty());
    }

    #[tokio::test]
    async fn a_failed_delete_rolls_the_row_back() {
        let backend = MockBackend::new();
        backend.seed_entry("TS1", "2024-06-03", dec!(4), Some("Dev"), "Draft");
        backend.fail_deletes.store(true, Ordering::SeqCst);

        let mut register = loaded_register(&backend, "2024-06-03").await;
        let row_idx = register.find_row("Dev").unwrap();
        register.delete_row(row_idx).await;

        assert_eq!(register.find_row("Dev"), Some(row_idx), "row restored");
        assert_eq!(register.grid.rows[row_idx].hours_on(d("2024-06-03")), dec!(4));
        assert_eq!(backend.entries.lock().unwrap().len(), 1);
        assert!(feedback_texts(&mut register)
            .iter()
            .any(|text| text.contains("deleting the task failed")));
        assert_eq!(register.phase(), OpPhase::Idle);
    }

    #[tokio::test]
    async fn feedback_entries_carry_their_severity() {
        let backend = MockBackend::new();
        let mut register = loaded_register(&backend, "2024-06-03").await;
        register.rename_task(0, "Dev");
        register.edit_cell(0, d("2024-06-03"), dec!(8));
        register.save_all().await;

        let saved = register
            .feedback
            .drain()
            .into_iter()
            .find(|message| message.text.contains("changes saved"))
            .expect("a success message after saving");
        assert_eq!(saved.severity, Severity::Success);
    }
}
