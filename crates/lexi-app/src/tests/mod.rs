mod waterfall_tests;
