mod actions_tests;
